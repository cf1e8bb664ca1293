use std::fs;
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::result::SessionResult;
use crate::session::text_input::{Char, Feedback, Settings, Step, TextInput};

/// One recorded keystroke. Backspace is recorded as `"\b"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub ch: char,
    pub time: u64,
}

/// A recorded typing session that can be replayed deterministically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub text: String,
    /// Settings recorded with the trace. When absent the caller's defaults apply.
    #[serde(default)]
    pub settings: Option<Settings>,
    /// Session start, used as the reference for the first keystroke's latency.
    #[serde(default)]
    pub start: Option<u64>,
    pub events: Vec<TraceEvent>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Replay {
    pub feedback: Vec<Feedback>,
    pub steps: Vec<Step>,
    pub chars: Vec<Char>,
    pub completed: bool,
    /// Events left over after the text was completed.
    pub ignored: usize,
    /// Settings the trace was replayed under.
    pub settings: Settings,
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let trace = serde_json::from_str(&content)
            .with_context(|| format!("parsing trace {}", path.display()))?;
        Ok(trace)
    }

    pub fn replay(&self) -> Replay {
        self.replay_with(Settings::default())
    }

    /// Replays under the trace's own settings, or `defaults` if it has none.
    pub fn replay_with(&self, defaults: Settings) -> Replay {
        let settings = self.settings.unwrap_or(defaults);
        let mut input = TextInput::new(&self.text, settings);
        let (tx, rx) = mpsc::channel();
        input.set_listener(move |step| {
            let _ = tx.send(*step);
        });

        let mut feedback = Vec::with_capacity(self.events.len());
        for event in &self.events {
            if input.completed() {
                break;
            }
            feedback.push(input.step(event.ch, event.time));
        }
        let ignored = self.events.len() - feedback.len();

        Replay {
            feedback,
            steps: rx.try_iter().collect(),
            chars: input.chars(),
            completed: input.completed(),
            ignored,
            settings,
        }
    }
}

impl Replay {
    pub fn count(&self, kind: Feedback) -> usize {
        self.feedback.iter().filter(|&&f| f == kind).count()
    }

    pub fn result(&self, trace: &Trace) -> Option<SessionResult> {
        SessionResult::from_steps(&self.steps, trace.start, self.settings)
    }
}
