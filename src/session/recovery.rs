//! Lookahead matchers that reinterpret buffered garbage as a single typo.
//!
//! Both matchers only decide whether a hypothesis holds; committing the
//! resulting steps is up to the caller.

use crate::keyboard::charset::CharClassifier;

/// Number of correctly typed characters that must follow the typo.
pub const LOOKAHEAD: usize = 3;

/// The first garbage char was typed in place of `target[cursor]`, and the
/// next [`LOOKAHEAD`] garbage chars match the text after it.
pub fn replaced_character(
    classifier: &dyn CharClassifier,
    target: &[char],
    cursor: usize,
    garbage: &[char],
) -> bool {
    garbage.len() > LOOKAHEAD
        && enough_text(target, cursor)
        && (0..LOOKAHEAD).all(|i| classifier.matches(garbage[i + 1], target[cursor + i + 1]))
}

/// `target[cursor]` was not typed at all, and the first [`LOOKAHEAD`]
/// garbage chars match the text after it.
pub fn skipped_character(
    classifier: &dyn CharClassifier,
    target: &[char],
    cursor: usize,
    garbage: &[char],
) -> bool {
    garbage.len() >= LOOKAHEAD
        && enough_text(target, cursor)
        && (0..LOOKAHEAD).all(|i| classifier.matches(garbage[i], target[cursor + i + 1]))
}

fn enough_text(target: &[char], cursor: usize) -> bool {
    cursor + LOOKAHEAD < target.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::charset::DefaultClassifier;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_replaced_needs_four_garbage_chars() {
        let target = chars("abcd");
        assert!(!replaced_character(&DefaultClassifier, &target, 0, &chars("xbc")));
        assert!(replaced_character(&DefaultClassifier, &target, 0, &chars("xbcd")));
    }

    #[test]
    fn test_replaced_rejects_mismatched_lookahead() {
        let target = chars("abcd");
        assert!(!replaced_character(&DefaultClassifier, &target, 0, &chars("xbxd")));
    }

    #[test]
    fn test_skipped_needs_three_garbage_chars() {
        let target = chars("abcd");
        assert!(!skipped_character(&DefaultClassifier, &target, 0, &chars("bc")));
        assert!(skipped_character(&DefaultClassifier, &target, 0, &chars("bcd")));
    }

    #[test]
    fn test_both_need_four_chars_of_text_left() {
        let target = chars("xabcd");
        // Cursor at 2 leaves only "bcd".
        assert!(!skipped_character(&DefaultClassifier, &target, 2, &chars("cd ")));
        assert!(!replaced_character(&DefaultClassifier, &target, 2, &chars("zcd ")));
        assert!(skipped_character(&DefaultClassifier, &target, 1, &chars("bcd")));
    }

    #[test]
    fn test_lookahead_uses_classifier_equivalence() {
        let target = chars("it\u{2019}s ok");
        // Skipped the 'i', typed a straight apostrophe for the curly one.
        assert!(skipped_character(&DefaultClassifier, &target, 0, &chars("t's")));
    }
}
