//! Keystroke tracking for typing practice.
//!
//! [`session::text_input::TextInput`] follows a fixed text one keystroke at a
//! time, buffering mistakes and recovering replaced or skipped characters
//! without looking ahead at future input. Committed steps feed the
//! per-character [`engine::histogram::Histogram`] and, through
//! [`session::result::SessionResult`], the result [`store`].

pub mod config;
pub mod engine;
pub mod keyboard;
pub mod session;
pub mod store;
