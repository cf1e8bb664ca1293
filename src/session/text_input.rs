use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keyboard::charset::{CharClassifier, DefaultClassifier};
use crate::keyboard::display::{BACKSPACE, SPACE};
use crate::session::recovery;

/// Only the most recent mistyped chars are candidates for recovery.
pub const GARBAGE_CAPACITY: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    Succeeded,
    Recovered,
    Failed,
}

/// One committed character of the typed text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub ch: char,
    pub time_stamp: u64,
    pub typo: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Refuse to move past a mistyped char until it is corrected.
    pub stop_on_error: bool,
    /// Accept the expected char even while mistyped chars are pending, and
    /// try to recover replaced and skipped chars.
    pub forgive_errors: bool,
    /// A space typed inside a word skips the rest of the word.
    pub space_skips_words: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stop_on_error: true,
            forgive_errors: true,
            space_skips_words: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attrs {
    Normal,
    Hit,
    Miss,
    Garbage,
    Cursor,
}

/// A display-annotated character produced by [`TextInput::chars`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Char {
    pub ch: char,
    pub attrs: Attrs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Garbage {
    ch: char,
    time_stamp: u64,
}

type Listener = Box<dyn FnMut(&Step)>;

/// Tracks progress through a fixed text one keystroke at a time.
///
/// Committed steps can never be edited. Mistyped chars are held in a small
/// garbage buffer where they can be erased with [`BACKSPACE`] or, when
/// errors are forgiven, reinterpreted as a single replaced or skipped char.
pub struct TextInput {
    target: Vec<char>,
    settings: Settings,
    classifier: Box<dyn CharClassifier>,
    steps: Vec<Step>,
    garbage: Vec<Garbage>,
    typo: bool,
    on_step: Listener,
}

impl TextInput {
    pub fn new(text: &str, settings: Settings) -> Self {
        Self::with_classifier(text, settings, Box::new(DefaultClassifier))
    }

    pub fn with_classifier(
        text: &str,
        settings: Settings,
        classifier: Box<dyn CharClassifier>,
    ) -> Self {
        Self {
            target: text.chars().collect(),
            settings,
            classifier,
            steps: Vec::new(),
            garbage: Vec::with_capacity(GARBAGE_CAPACITY),
            typo: false,
            on_step: Box::new(|_| {}),
        }
    }

    /// Called synchronously once per committed step, in commit order.
    pub fn set_listener(&mut self, listener: impl FnMut(&Step) + 'static) {
        self.on_step = Box::new(listener);
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn garbage(&self) -> impl Iterator<Item = char> + '_ {
        self.garbage.iter().map(|g| g.ch)
    }

    pub fn has_typo(&self) -> bool {
        self.typo
    }

    pub fn cursor(&self) -> usize {
        self.steps.len()
    }

    pub fn completed(&self) -> bool {
        self.steps.len() >= self.target.len()
    }

    pub fn reset(&mut self) {
        self.steps.clear();
        self.garbage.clear();
        self.typo = false;
    }

    /// Feeds one typed char.
    ///
    /// # Panics
    ///
    /// Panics if the text is already completed.
    pub fn step(&mut self, ch: char, time_stamp: u64) -> Feedback {
        assert!(
            !self.completed(),
            "TextInput::step called after the text was completed"
        );

        let ch = if ch != BACKSPACE && self.classifier.is_whitespace(ch) {
            SPACE
        } else {
            ch
        };

        // Spaces before the first real char are ignored.
        if self.steps.is_empty() && self.garbage.is_empty() && !self.typo && ch == SPACE {
            return Feedback::Succeeded;
        }

        if ch == BACKSPACE {
            return match self.garbage.pop() {
                Some(_) => Feedback::Succeeded,
                None => Feedback::Failed,
            };
        }

        let expected = self.target[self.steps.len()];

        if ch == SPACE && !self.classifier.is_whitespace(expected) {
            if self.garbage.is_empty() && self.at_word_start() {
                return Feedback::Succeeded;
            }
            if self.settings.space_skips_words {
                self.skip_word(time_stamp);
                return Feedback::Recovered;
            }
        }

        if self.classifier.matches(ch, expected)
            && (self.settings.forgive_errors || self.garbage.is_empty())
        {
            let typo = self.typo;
            self.commit(Step {
                ch: expected,
                time_stamp,
                typo,
            });
            self.garbage.clear();
            self.typo = false;
            return if typo {
                Feedback::Recovered
            } else {
                Feedback::Succeeded
            };
        }

        self.typo = true;
        if self.buffers_garbage() && self.garbage.len() < GARBAGE_CAPACITY {
            self.garbage.push(Garbage { ch, time_stamp });
        }
        if self.settings.forgive_errors && (self.recover_replaced() || self.recover_skipped()) {
            return Feedback::Recovered;
        }
        Feedback::Failed
    }

    /// The whole text annotated for display, with pending garbage spliced in
    /// at the cursor.
    pub fn chars(&self) -> Vec<Char> {
        let cursor = self.steps.len();
        let mut chars = Vec::with_capacity(self.target.len() + self.garbage.len());
        for (i, &ch) in self.target.iter().enumerate() {
            if i < cursor {
                let attrs = if self.steps[i].typo {
                    Attrs::Miss
                } else {
                    Attrs::Hit
                };
                chars.push(Char { ch, attrs });
            } else if i == cursor {
                if !self.settings.stop_on_error {
                    chars.extend(self.garbage.iter().map(|g| Char {
                        ch: g.ch,
                        attrs: Attrs::Garbage,
                    }));
                }
                chars.push(Char {
                    ch,
                    attrs: Attrs::Cursor,
                });
            } else {
                chars.push(Char {
                    ch,
                    attrs: Attrs::Normal,
                });
            }
        }
        chars
    }

    fn buffers_garbage(&self) -> bool {
        !self.settings.stop_on_error || self.settings.forgive_errors
    }

    fn at_word_start(&self) -> bool {
        match self.steps.last() {
            None => true,
            Some(step) => self.classifier.is_whitespace(step.ch),
        }
    }

    fn commit(&mut self, step: Step) {
        self.steps.push(step);
        (self.on_step)(&step);
    }

    /// Commits buffered chars as correct, stopping at the end of the text.
    fn commit_garbage(&mut self, garbage: &[Garbage]) {
        for g in garbage {
            let Some(&expected) = self.target.get(self.steps.len()) else {
                break;
            };
            let ch = if self.classifier.matches(g.ch, expected) {
                expected
            } else {
                g.ch
            };
            self.commit(Step {
                ch,
                time_stamp: g.time_stamp,
                typo: false,
            });
        }
    }

    fn garbage_chars(&self) -> Vec<char> {
        self.garbage.iter().map(|g| g.ch).collect()
    }

    fn recover_replaced(&mut self) -> bool {
        let cursor = self.steps.len();
        let typed = self.garbage_chars();
        if !recovery::replaced_character(self.classifier.as_ref(), &self.target, cursor, &typed) {
            return false;
        }
        debug!(cursor, replaced = %typed[0], "recovered replaced character");
        let garbage = std::mem::take(&mut self.garbage);
        self.commit(Step {
            ch: self.target[cursor],
            time_stamp: garbage[0].time_stamp,
            typo: true,
        });
        self.commit_garbage(&garbage[1..]);
        self.typo = false;
        true
    }

    fn recover_skipped(&mut self) -> bool {
        let cursor = self.steps.len();
        let typed = self.garbage_chars();
        if !recovery::skipped_character(self.classifier.as_ref(), &self.target, cursor, &typed) {
            return false;
        }
        debug!(cursor, skipped = %self.target[cursor], "recovered skipped character");
        let garbage = std::mem::take(&mut self.garbage);
        // The skipped char gets the time of the first char actually typed.
        self.commit(Step {
            ch: self.target[cursor],
            time_stamp: garbage[0].time_stamp,
            typo: true,
        });
        self.commit_garbage(&garbage);
        self.typo = false;
        true
    }

    fn skip_word(&mut self, time_stamp: u64) {
        let from = self.steps.len();
        while let Some(&ch) = self.target.get(self.steps.len()) {
            if self.classifier.is_whitespace(ch) {
                break;
            }
            self.commit(Step {
                ch,
                time_stamp,
                typo: true,
            });
        }
        if let Some(&ch) = self.target.get(self.steps.len()) {
            self.commit(Step {
                ch,
                time_stamp,
                typo: false,
            });
        }
        debug!(from, to = self.steps.len(), "skipped word");
        self.garbage.clear();
        self.typo = false;
    }
}

impl fmt::Debug for TextInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextInput")
            .field("target", &self.target.iter().collect::<String>())
            .field("settings", &self.settings)
            .field("steps", &self.steps)
            .field("garbage", &self.garbage)
            .field("typo", &self.typo)
            .finish_non_exhaustive()
    }
}
