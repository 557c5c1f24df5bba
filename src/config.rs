use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{require_non_negative, require_positive, Result, ScoringError};

// ─── Defaults ────────────────────────────────────────────────────────────────

pub const DEFAULT_GPS_SIGMA: f64 = 3.0; // meters
pub const DEFAULT_LWR_TAU: f64 = 1.0;
pub const DEFAULT_TRANSITION_BETA: f64 = 0.5;
pub const DEFAULT_THRESHOLD_DISTANCE: f64 = 50.0; // meters

// ─── Configuration ───────────────────────────────────────────────────────────

/// Tuning parameters for emission and transition scoring.
///
/// Every field can be omitted from a JSON config and falls back to its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    // ── Emission ──
    pub gps_sigma: f64,
    pub lwr_tau: f64,

    // ── Transition ──
    pub transition_beta: f64,

    // ── Candidate pre-filter ──
    pub threshold_distance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            gps_sigma: DEFAULT_GPS_SIGMA,
            lwr_tau: DEFAULT_LWR_TAU,
            transition_beta: DEFAULT_TRANSITION_BETA,
            threshold_distance: DEFAULT_THRESHOLD_DISTANCE,
        }
    }
}

impl ScoringConfig {
    /// Fail on values that would turn densities or weights into NaN/inf
    pub fn validate(&self) -> Result<()> {
        require_positive("gps_sigma", self.gps_sigma)?;
        require_positive("lwr_tau", self.lwr_tau)?;
        require_positive("transition_beta", self.transition_beta)?;
        require_non_negative("threshold_distance", self.threshold_distance)?;
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ScoringConfig = serde_json::from_str(json)
            .map_err(|e| ScoringError::Config(format!("Failed to parse config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ScoringError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}
