use icu_normalizer::ComposingNormalizerBorrowed;

use crate::keyboard::display::SPACE;

const NFKC: ComposingNormalizerBorrowed<'static> = ComposingNormalizerBorrowed::new_nfkc();

/// Decides which typed characters count as the expected one.
///
/// Two characters match when their folds are equal. Folding must be
/// idempotent: `fold(fold(c)) == fold(c)`.
pub trait CharClassifier {
    fn is_whitespace(&self, ch: char) -> bool;

    fn fold(&self, ch: char) -> char;

    fn matches(&self, typed: char, expected: char) -> bool {
        self.fold(typed) == self.fold(expected)
    }
}

/// Unicode whitespace folds to a plain space, typographic quotes and dashes
/// fold to ASCII, and everything else goes through NFKC when that yields a
/// single character.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultClassifier;

impl CharClassifier for DefaultClassifier {
    fn is_whitespace(&self, ch: char) -> bool {
        ch.is_whitespace()
    }

    fn fold(&self, ch: char) -> char {
        if ch.is_whitespace() {
            return SPACE;
        }
        match ch {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}'
            | '\u{00BB}' => '"',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            _ if ch.is_ascii() => ch,
            _ => {
                let mut buf = [0u8; 4];
                let normalized = NFKC.normalize(ch.encode_utf8(&mut buf));
                let mut chars = normalized.chars();
                match (chars.next(), chars.next()) {
                    (Some(single), None) => single,
                    _ => ch,
                }
            }
        }
    }
}
