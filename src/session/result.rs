use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::histogram::{Histogram, Sample};
use crate::session::text_input::{Settings, Step};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub settings: Settings,
    pub length: usize,
    pub time_ms: u64,
    pub errors: usize,
    pub speed_cpm: f64,
    pub accuracy: f64,
    #[serde(default)]
    pub histogram: Vec<Sample>,
}

impl SessionResult {
    /// Summarises a session from its committed steps. Returns `None` when
    /// nothing was committed.
    pub fn from_steps(
        steps: &[Step],
        started_at: Option<u64>,
        settings: Settings,
    ) -> Option<Self> {
        let first = steps.first()?;
        let last = steps.last()?;
        let start = started_at.unwrap_or(first.time_stamp);
        let time_ms = last.time_stamp.saturating_sub(start);

        let length = steps.len();
        let errors = steps.iter().filter(|s| s.typo).count();
        let speed_cpm = if time_ms < 100 {
            0.0
        } else {
            length as f64 / (time_ms as f64 / 60000.0)
        };
        let accuracy = ((length - errors) as f64 / length as f64 * 100.0).clamp(0.0, 100.0);

        Some(Self {
            timestamp: Utc::now(),
            settings,
            length,
            time_ms,
            errors,
            speed_cpm,
            accuracy,
            histogram: Histogram::from_steps(steps, started_at).samples().to_vec(),
        })
    }

    pub fn wpm(&self) -> f64 {
        self.speed_cpm / 5.0
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }

    pub fn histogram(&self) -> Histogram {
        Histogram::new(self.histogram.iter().copied())
    }
}
