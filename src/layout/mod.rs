//! Layout engine for upload batches
//!
//! This module arranges a batch of images into a grid, wraps it in a padded
//! canvas, and derives the anchors for every text block placed on that
//! canvas. It is pure: nothing here talks to the remote service.

pub mod config;
pub mod error;
pub mod grid;
pub mod types;

pub use config::{CanvasPadding, GridLayoutConfig};
pub use error::LayoutError;
pub use grid::{column_count, min_columns_for, GridLayout, CANVAS_TITLE_MAX_LEN, TOP_TITLE_MAX_LEN};
pub use types::*;

const ELLIPSIS: &str = "...";

/// Shorten `text` to at most `max_len` characters
///
/// When the text is too long the last three kept characters are replaced
/// with an ellipsis. Lengths are counted in characters, so multi-byte
/// prompts are never split inside a code point. Limits shorter than the
/// ellipsis yield a shortened ellipsis.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len < ELLIPSIS.len() {
        return ELLIPSIS[..max_len].to_string();
    }
    let keep = max_len - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_long() {
        let result = truncate(&"A".repeat(150), 100);
        assert_eq!(result.chars().count(), 100);
        assert!(result.ends_with("..."));
        assert_eq!(&result[..97], "A".repeat(97));
    }

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn test_truncate_exact_length() {
        let text = "B".repeat(100);
        assert_eq!(truncate(&text, 100), text);
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "é".repeat(10);
        assert_eq!(truncate(&text, 5), "éé...");
    }

    #[test]
    fn test_truncate_never_exceeds_tiny_limit() {
        assert_eq!(truncate("abcdef", 3), "...");
        assert_eq!(truncate("abcdef", 2), "..");
        assert_eq!(truncate("abcdef", 0), "");
        assert_eq!(truncate("ab", 2), "ab");
    }
}
