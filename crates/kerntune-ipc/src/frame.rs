//! Length-prefixed JSON framing for the daemon socket.
//!
//! Every message on the wire is a 4-byte big-endian length followed by that
//! many bytes of JSON. Frames are bounded by [`MAX_FRAME`]; a peer announcing
//! anything larger is protocol-broken and the connection is dropped.

use thiserror::Error;

/// Largest frame either side will accept, in bytes.
pub const MAX_FRAME: u32 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame length is zero")]
    Empty,
    #[error("frame length {0} exceeds limit {1}")]
    TooLarge(u32, u32),
}

/// Prefix a payload with its big-endian length.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Validate a received length prefix against the negotiated frame limit.
pub fn decode_frame_length(header: [u8; 4], max_frame: u32) -> Result<u32, FrameError> {
    let len = u32::from_be_bytes(header);
    if len == 0 {
        return Err(FrameError::Empty);
    }
    if len > max_frame {
        return Err(FrameError::TooLarge(len, max_frame));
    }
    Ok(len)
}
