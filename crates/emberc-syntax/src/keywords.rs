//! Ember language keywords.
//!
//! These are pre-interned in the string interner (`emberc_mem::StringInterner`)
//! for fast keyword detection during lexing.

/// All 15 Ember keywords, in the same order `emberc_mem`'s interner
/// pre-interns them in, so their `Symbol` ids line up.
pub const KEYWORDS: &[&str] = &[
    "fn", "var", "if", "else", "while", "for", "in", "return", "break",
    "continue", "shared", "private", "true", "false", "nil",
];

/// Number of keywords.
pub const KEYWORD_COUNT: u32 = KEYWORDS.len() as u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_count() {
        assert_eq!(KEYWORDS.len() as u32, KEYWORD_COUNT);
    }

    #[test]
    fn test_expected_keywords_present() {
        assert!(KEYWORDS.contains(&"fn"));
        assert!(KEYWORDS.contains(&"var"));
        assert!(KEYWORDS.contains(&"shared"));
        assert!(KEYWORDS.contains(&"private"));
        assert!(KEYWORDS.contains(&"in"));
        assert!(KEYWORDS.contains(&"nil"));
    }

    #[test]
    fn test_no_duplicates() {
        let unique_keywords: std::collections::HashSet<_> = KEYWORDS.iter().collect();
        assert_eq!(unique_keywords.len(), KEYWORDS.len());
    }
}
