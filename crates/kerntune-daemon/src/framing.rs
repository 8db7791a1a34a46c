//! Async frame IO over the daemon's Unix sockets.

use anyhow::{anyhow, bail, Result};
use kerntune_ipc::{decode_frame_length, encode_frame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub async fn read_frame<S>(stream: &mut S, max_frame: u32) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = decode_frame_length(len_buf, max_frame)
        .map_err(|err| anyhow!("invalid frame length: {err}"))?;
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_frame<S>(stream: &mut S, payload: &[u8], max_frame: u32) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    if payload.is_empty() {
        bail!("empty payload");
    }
    if payload.len() as u32 > max_frame {
        bail!("payload exceeds max_frame");
    }
    let frame = encode_frame(payload);
    stream.write_all(&frame).await?;
    Ok(())
}
