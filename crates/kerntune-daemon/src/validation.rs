//! Request-edge validation.
//!
//! Everything that ends up in a kernel path or a boot script is restricted
//! to `[A-Za-z0-9_]` tokens. Requests with any invalid field are rejected
//! whole, before the first write.

use kerntune_ipc::{ParamWrite, WireError};

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_value(field: &str, value: &str) -> Result<(), WireError> {
    if is_token(value) {
        Ok(())
    } else {
        Err(WireError::bad_request(format!("Invalid or missing {field}")))
    }
}

pub fn validate_param_writes(field: &str, entries: &[ParamWrite]) -> Result<(), WireError> {
    for entry in entries {
        if !is_token(&entry.name) {
            return Err(WireError::bad_request(format!(
                "Invalid or missing name in {field} entry"
            )));
        }
        if !is_token(&entry.value) {
            return Err(WireError::bad_request(format!(
                "Invalid or missing value in {field} entry"
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompcacheRequest {
    pub enable: bool,
    pub memlimit_kb: String,
}

/// Pull the enable flag and memory limit out of a compcacheConfig entry
/// list. The limit must be present and numeric even when disabling, so a
/// later enable has a sane value to replay.
pub fn parse_compcache_config(entries: &[ParamWrite]) -> Result<CompcacheRequest, WireError> {
    validate_param_writes("compcacheConfig", entries)?;

    let mut enable = false;
    let mut memlimit_kb = None;
    for entry in entries {
        match entry.name.as_str() {
            "compcache_enabled" => enable = entry.value == "1",
            "compcache_memlimit" => memlimit_kb = Some(entry.value.clone()),
            _ => {}
        }
    }

    match memlimit_kb {
        Some(limit) if limit.chars().all(|c| c.is_ascii_digit()) => Ok(CompcacheRequest {
            enable,
            memlimit_kb: limit,
        }),
        _ => Err(WireError::bad_request("Invalid or missing memlimit")),
    }
}
