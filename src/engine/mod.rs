pub mod histogram;
pub mod key_stats;
