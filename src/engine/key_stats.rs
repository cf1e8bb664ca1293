use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::histogram::Histogram;

const EMA_ALPHA: f64 = 0.1;
const DEFAULT_TARGET_CPM: f64 = 175.0;
const MAX_RECENT: usize = 30;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyStat {
    pub filtered_time_ms: f64,
    pub best_time_ms: f64,
    pub confidence: f64,
    pub sample_count: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub recent_times: Vec<f64>,
}

impl Default for KeyStat {
    fn default() -> Self {
        Self {
            filtered_time_ms: 1000.0,
            best_time_ms: f64::MAX,
            confidence: 0.0,
            sample_count: 0,
            hit_count: 0,
            miss_count: 0,
            recent_times: Vec::new(),
        }
    }
}

impl KeyStat {
    pub fn miss_rate(&self) -> f64 {
        if self.hit_count == 0 {
            return 0.0;
        }
        self.miss_count as f64 / self.hit_count as f64
    }
}

/// Learning state per key, accumulated across sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyStatsStore {
    pub stats: BTreeMap<char, KeyStat>,
    pub target_cpm: f64,
}

impl Default for KeyStatsStore {
    fn default() -> Self {
        Self {
            stats: BTreeMap::new(),
            target_cpm: DEFAULT_TARGET_CPM,
        }
    }
}

impl KeyStatsStore {
    /// Changes the target speed and rescores every timed key against it.
    pub fn set_target_cpm(&mut self, target_cpm: f64) {
        self.target_cpm = target_cpm;
        let target_time_ms = 60000.0 / target_cpm;
        for stat in self.stats.values_mut().filter(|s| s.sample_count > 0) {
            stat.confidence = target_time_ms / stat.filtered_time_ms;
        }
    }

    /// Folds one session's histogram in. Samples without a timing only
    /// contribute to the hit/miss counts.
    pub fn update_from_histogram(&mut self, histogram: &Histogram) {
        let target_time_ms = 60000.0 / self.target_cpm;
        for sample in histogram.iter() {
            let stat = self.stats.entry(sample.ch).or_default();
            stat.hit_count += u64::from(sample.hit_count);
            stat.miss_count += u64::from(sample.miss_count);
            if sample.time_to_type <= 0.0 {
                continue;
            }

            let time_ms = sample.time_to_type;
            stat.sample_count += 1;
            if stat.sample_count == 1 {
                stat.filtered_time_ms = time_ms;
            } else {
                stat.filtered_time_ms =
                    EMA_ALPHA * time_ms + (1.0 - EMA_ALPHA) * stat.filtered_time_ms;
            }
            stat.best_time_ms = stat.best_time_ms.min(stat.filtered_time_ms);
            stat.confidence = target_time_ms / stat.filtered_time_ms;

            stat.recent_times.push(time_ms);
            if stat.recent_times.len() > MAX_RECENT {
                stat.recent_times.remove(0);
            }
        }
    }

    pub fn get_confidence(&self, key: char) -> f64 {
        self.stats.get(&key).map(|s| s.confidence).unwrap_or(0.0)
    }

    pub fn get_stat(&self, key: char) -> Option<&KeyStat> {
        self.stats.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::histogram::Sample;

    fn histogram(ch: char, time_to_type: f64, hits: u32, misses: u32) -> Histogram {
        Histogram::new([Sample {
            ch,
            hit_count: hits,
            miss_count: misses,
            time_to_type,
        }])
    }

    #[test]
    fn test_initial_confidence_is_zero() {
        let store = KeyStatsStore::default();
        assert_eq!(store.get_confidence('a'), 0.0);
    }

    #[test]
    fn test_update_creates_stat() {
        let mut store = KeyStatsStore::default();
        store.update_from_histogram(&histogram('e', 300.0, 5, 1));
        assert!(store.get_confidence('e') > 0.0);
        let stat = store.get_stat('e').unwrap();
        assert_eq!(stat.sample_count, 1);
        assert_eq!(stat.hit_count, 5);
        assert_eq!(stat.miss_count, 1);
        assert!((stat.miss_rate() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_ema_converges_for_fast_typing() {
        let mut store = KeyStatsStore::default();
        for _ in 0..50 {
            store.update_from_histogram(&histogram('t', 200.0, 1, 0));
        }
        // target_time = 60000 / 175 = 342.8ms, so 200ms typing gives ~1.71
        let conf = store.get_confidence('t');
        assert!(conf > 1.0, "confidence should be > 1.0, got {conf}");
        assert_eq!(store.get_stat('t').unwrap().recent_times.len(), MAX_RECENT);
    }

    #[test]
    fn test_slow_typing_low_confidence() {
        let mut store = KeyStatsStore::default();
        for _ in 0..50 {
            store.update_from_histogram(&histogram('a', 1000.0, 1, 0));
        }
        let conf = store.get_confidence('a');
        assert!(conf < 1.0, "confidence should be < 1.0, got {conf}");
    }

    #[test]
    fn test_untimed_sample_only_counts() {
        let mut store = KeyStatsStore::default();
        store.update_from_histogram(&histogram('q', 0.0, 2, 2));
        let stat = store.get_stat('q').unwrap();
        assert_eq!(stat.sample_count, 0);
        assert_eq!(stat.hit_count, 2);
        assert_eq!(store.get_confidence('q'), 0.0);
    }

    #[test]
    fn test_set_target_cpm_rescores_all_keys() {
        let mut store = KeyStatsStore::default();
        store.update_from_histogram(&histogram('a', 300.0, 1, 0));
        store.update_from_histogram(&histogram('q', 0.0, 1, 0));
        store.set_target_cpm(100.0);
        store.update_from_histogram(&histogram('b', 600.0, 1, 0));

        // 60000 / 100 = 600ms target
        assert!((store.get_confidence('a') - 2.0).abs() < 1e-9);
        assert!((store.get_confidence('b') - 1.0).abs() < 1e-9);
        assert_eq!(store.get_confidence('q'), 0.0);
    }
}
