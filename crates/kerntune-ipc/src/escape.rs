//! JSON-string-safe text encoding for raw kernel and subprocess bytes.
//!
//! Values read out of sysfs or captured from a subprocess are not guaranteed
//! to be printable, or even UTF-8. Before such bytes become a JSON string
//! value they pass through [`escape_text`], which renders them as pure
//! printable ASCII: the usual short escapes for the common control
//! characters, `\u00XX` for everything else outside the printable range, and
//! a straight copy for the rest. Clean text comes back unchanged.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Encode arbitrary bytes as a JSON-string-safe ASCII string.
///
/// Output length is bounded by six bytes per input byte, and the encoder
/// never fails: malformed or binary input simply produces more escapes.
pub fn escape_text(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input {
        match b {
            b'\x08' => out.push_str("\\b"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            // DEL (0x7f) passes through; only the ranges below are hidden.
            b if b < 0x20 || b > 0x7f => {
                out.push('\\');
                out.push('u');
                out.push('0');
                out.push('0');
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0xf) as usize] as char);
            }
            b => out.push(b as char),
        }
    }
    out
}

/// Escape a line of text that is already valid UTF-8.
pub fn escape_str(input: &str) -> String {
    escape_text(input.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_unchanged() {
        assert_eq!(escape_str("performance"), "performance");
        assert_eq!(escape_str("500000 1000000"), "500000 1000000");
    }

    #[test]
    fn empty_input() {
        assert_eq!(escape_text(b""), "");
    }

    #[test]
    fn newline_becomes_two_characters() {
        assert_eq!(escape_str("a\nb"), "a\\nb");
    }

    #[test]
    fn short_escapes() {
        assert_eq!(escape_str("\u{8}\t\r\"\\"), "\\b\\t\\r\\\"\\\\");
    }

    #[test]
    fn control_and_high_bytes_become_hex_escapes() {
        assert_eq!(escape_text(b"\x01"), "\\u0001");
        assert_eq!(escape_text(b"\x1b[0m"), "\\u001b[0m");
        assert_eq!(escape_text(b"\xff"), "\\u00ff");
    }

    #[test]
    fn del_passes_through() {
        assert_eq!(escape_text(b"\x7f"), "\u{7f}".to_string());
    }

    #[test]
    fn output_is_bounded() {
        let input = vec![0u8; 1024];
        let out = escape_text(&input);
        assert!(out.len() <= input.len() * 6);
        assert!(out.is_ascii());
    }

    #[test]
    fn escaping_is_stable_on_its_own_output() {
        // The escaped form contains backslashes, which escape again; the
        // point is that the encoder terminates and stays ASCII either way.
        let once = escape_str("a\nb");
        let twice = escape_str(&once);
        assert_eq!(twice, "a\\\\nb");
    }
}
