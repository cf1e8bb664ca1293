use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::session::text_input::Step;

/// Per-char typing statistics of one session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ch: char,
    pub hit_count: u32,
    pub miss_count: u32,
    /// Mean time in ms from the previous step, over non-typo steps only.
    /// Zero when no such step was observed.
    pub time_to_type: f64,
}

/// Samples sorted by char, read-only once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Histogram {
    samples: Vec<Sample>,
}

#[derive(Default)]
struct Accumulator {
    hit_count: u32,
    miss_count: u32,
    time_sum: u64,
    time_count: u32,
}

impl Histogram {
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut samples: Vec<Sample> = samples.into_iter().collect();
        samples.sort_by_key(|s| s.ch);
        Self { samples }
    }

    /// Builds a histogram from committed steps. The first step's latency is
    /// measured from `started_at` when given and ignored otherwise, so a
    /// char's mean covers every non-typo step only when `started_at` is
    /// passed. Without it the first step adds counts but no time.
    pub fn from_steps(steps: &[Step], started_at: Option<u64>) -> Self {
        let mut acc: BTreeMap<char, Accumulator> = BTreeMap::new();
        let mut prev = started_at;
        for step in steps {
            let entry = acc.entry(step.ch).or_default();
            entry.hit_count += 1;
            if step.typo {
                entry.miss_count += 1;
            } else if let Some(prev) = prev {
                entry.time_sum += step.time_stamp.saturating_sub(prev);
                entry.time_count += 1;
            }
            prev = Some(step.time_stamp);
        }

        let samples = acc
            .into_iter()
            .map(|(ch, a)| Sample {
                ch,
                hit_count: a.hit_count,
                miss_count: a.miss_count,
                time_to_type: if a.time_count > 0 {
                    a.time_sum as f64 / a.time_count as f64
                } else {
                    0.0
                },
            })
            .collect();
        Self { samples }
    }

    pub fn get(&self, ch: char) -> Option<&Sample> {
        self.samples
            .binary_search_by_key(&ch, |s| s.ch)
            .ok()
            .map(|i| &self.samples[i])
    }

    /// Number of distinct chars observed.
    pub fn complexity(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
