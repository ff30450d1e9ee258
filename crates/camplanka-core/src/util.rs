//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Check that a value can be used as a single document path segment.
pub fn is_valid_segment(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" site-1 ".to_string())),
            Some("site-1".to_string())
        );
    }

    #[test]
    fn compact_text_truncates_long_messages() {
        let long = "x".repeat(400);
        assert_eq!(compact_text(&long).len(), 180);
        assert_eq!(compact_text("  short  "), "short");
    }

    #[test]
    fn is_valid_segment_rejects_slashes_and_blanks() {
        assert!(is_valid_segment("site-1"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment("  "));
        assert!(!is_valid_segment("users/u1"));
    }
}
