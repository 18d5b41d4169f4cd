//! Log sanitization utilities
//!
//! Statement sources, checkers and review reports are routinely many kilobytes long.
//! These helpers keep request/response logging readable by capping what reaches a log line.

/// Maximum number of bytes of a body included in a log line.
const TRUNCATE_LIMIT: usize = 256;

/// Largest char boundary at or below `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}

/// Truncate a body for logging.
///
/// Returns the original string when it fits, otherwise the first `TRUNCATE_LIMIT` bytes
/// (never splitting a character) followed by the total length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// One-line summary of a source file for logs: size and line count, no content.
pub fn describe_source(code: &str) -> String {
    format!("{} bytes, {} lines", code.len(), code.lines().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_unchanged() {
        let s = "{\"statements\":[]}";
        assert_eq!(truncate_for_log(s), s);
    }

    #[test]
    fn body_at_limit_unchanged() {
        let s = "x".repeat(TRUNCATE_LIMIT);
        assert_eq!(truncate_for_log(&s), s);
    }

    #[test]
    fn long_body_truncated_with_total() {
        let s = "int main() {}\n".repeat(100);
        let result = truncate_for_log(&s);
        assert!(result.ends_with(&format!("[truncated, total {} bytes]", s.len())));
        assert!(result.len() < s.len());
    }

    #[test]
    fn multibyte_statement_text_is_not_split() {
        // Cyrillic statements are common; each char is 2 bytes.
        let s = "задача".repeat(100);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total"));
    }

    #[test]
    fn describe_source_counts_lines() {
        assert_eq!(describe_source("a\nb\nc"), "5 bytes, 3 lines");
        assert_eq!(describe_source(""), "0 bytes, 0 lines");
    }
}
