//! Entry store and HTTP surface for a deadline-gated bracket pool.
//!
//! Contestants register with an institutional email, submit a bracket document until the
//! contest deadline, and are ranked on a leaderboard. Scoring and locking happen out-of-band
//! through the repository's administrative methods.

pub mod config;
pub mod contest;
pub mod error;
pub mod storage;
pub mod telemetry;
