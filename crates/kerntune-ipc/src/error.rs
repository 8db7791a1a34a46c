//! Wire-level error replies.
//!
//! Every failed method reply is a JSON object carrying `returnValue: false`,
//! a human-readable `errorText`, and (almost always) a numeric `errorCode`.
//! The one exception: probing a governor directory that does not exist is an
//! expected condition for some governors, so that reply carries text but no
//! code, and clients treat it as "nothing here" rather than a fault.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Numeric error taxonomy. `BadRequest` keeps the historical `-1` that
/// callers of the original service matched on for malformed payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    BadRequest = -1,
    Io = -2,
    CommandFailed = -3,
    NotFound = -4,
    Delegate = -5,
    Internal = -6,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    #[serde(rename = "returnValue")]
    pub return_value: bool,
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(rename = "errorText")]
    pub text: String,
    /// Captured subprocess output lines, attached when a command failed.
    #[serde(rename = "stdErr", skip_serializing_if = "Option::is_none")]
    pub std_err: Option<Vec<String>>,
}

impl WireError {
    pub fn new(code: ErrorCode, text: impl Into<String>) -> Self {
        Self {
            return_value: false,
            code: Some(code),
            text: text.into(),
            std_err: None,
        }
    }

    /// An expected failure: `returnValue: false` with text but no code.
    pub fn expected(text: impl Into<String>) -> Self {
        Self {
            return_value: false,
            code: None,
            text: text.into(),
            std_err: None,
        }
    }

    pub fn bad_request(text: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, text)
    }

    pub fn with_std_err(mut self, lines: Vec<String>) -> Self {
        self.std_err = Some(lines);
        self
    }
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
