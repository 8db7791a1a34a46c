//! Token validation for user-supplied names and values.
//!
//! Anything that ends up in a filesystem path or a generated script must be
//! a plain `[A-Za-z0-9_]` token. The check runs before any filesystem access.

use crate::services::error::ServiceError;

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Reject anything that is not a non-empty `[A-Za-z0-9_]` token.
///
/// `field` names the offending request field in the error text.
pub fn validate_token(field: &str, token: &str) -> Result<(), ServiceError> {
    if token.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "Invalid or missing {field}"
        )));
    }
    if !token.chars().all(is_token_char) {
        return Err(ServiceError::InvalidInput(format!(
            "Invalid or missing {field}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_tokens() {
        assert!(validate_token("name", "scaling_governor").is_ok());
        assert!(validate_token("value", "500000").is_ok());
        assert!(validate_token("value", "OnDemand_2").is_ok());
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(validate_token("name", "../etc/passwd").is_err());
        assert!(validate_token("name", "..").is_err());
        assert!(validate_token("name", "a/b").is_err());
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(validate_token("value", "1; rm -rf /").is_err());
        assert!(validate_token("value", "a'b").is_err());
        assert!(validate_token("value", "a b").is_err());
        assert!(validate_token("value", "a\nb").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_token("name", "").is_err());
    }
}
