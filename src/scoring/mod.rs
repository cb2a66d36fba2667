// src/scoring/mod.rs

//! Pure scoring core plus the store-backed ranking refresh.

pub mod certification;
pub mod policy;
pub mod ranking;
pub mod refresh;
pub mod scorer;

pub use policy::ScoringPolicy;
pub use refresh::{RefreshOutcome, refresh_rankings};
pub use scorer::{SessionMetrics, score};
