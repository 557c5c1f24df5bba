//! Emission and transition scoring for HMM map matching.
//!
//! Given a GPS fix and nearby candidate ways, this crate produces
//! per-vertex emission features (Gaussian distance density and heading
//! alignment) and a segment-to-segment transition score matrix for a
//! downstream decoder. Candidate retrieval and path decoding live outside
//! this crate.
//!
//! Everything here is a pure function of its inputs; scorers are immutable
//! once built and can be shared across threads.

pub mod config;
pub mod error;
pub mod map_match;
pub mod types;

pub use config::ScoringConfig;
pub use error::{Result, ScoringError};
