use std::io;

use kerntune_ipc::{escape_str, ErrorCode, WireError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing request field; nothing was attempted.
    #[error("{0}")]
    InvalidInput(String),

    /// Filesystem open/read/write/close failure.
    #[error("{text}")]
    Io {
        text: String,
        #[source]
        source: io::Error,
    },

    /// Subprocess failed to start or exited non-zero; `output` holds the
    /// captured (already escaped) stdout/stderr lines.
    #[error("Unable to run command: {command}")]
    Command {
        command: String,
        output: Vec<String>,
    },

    /// An expected failure that callers probe for (e.g. a governor without
    /// a parameter directory). Reported without an error code.
    #[error("{0}")]
    Expected(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn io(text: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            text: text.into(),
            source,
        }
    }

    pub fn to_wire_error(&self) -> WireError {
        match self {
            Self::InvalidInput(text) => WireError::bad_request(text.clone()),
            Self::Io { text, .. } => WireError::new(ErrorCode::Io, text.clone()),
            Self::Command { command, output } => WireError::new(
                ErrorCode::CommandFailed,
                format!("Unable to run command: {}", escape_str(command)),
            )
            .with_std_err(output.clone()),
            Self::Expected(text) => WireError::expected(text.clone()),
            Self::Internal(text) => WireError::new(ErrorCode::Internal, text.clone()),
        }
    }
}
