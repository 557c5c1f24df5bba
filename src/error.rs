use geo::Point;

use crate::types::WayId;

/// Errors raised by the scoring layer.
///
/// All of these indicate malformed input or configuration and are not
/// retryable. None of them is ever folded into a zero score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("way {osm_id} has no points")]
    EmptyWay { osm_id: WayId },

    #[error("way {osm_id} has a non-finite coordinate at index {index}")]
    NonFiniteCoordinate { osm_id: WayId, index: usize },

    #[error("{set} segment {index} has a non-finite endpoint")]
    NonFiniteSegment { set: &'static str, index: usize },

    #[error("point index {index} out of bounds for way with {len} points")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("way {osm_id} is missing {feature}")]
    MissingFeature {
        osm_id: WayId,
        feature: &'static str,
    },

    #[error("way {osm_id}: {feature} has {found} entries, expected {expected}")]
    LengthMismatch {
        osm_id: WayId,
        feature: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("features belong to way {found}, expected way {expected}")]
    WayMismatch { expected: WayId, found: WayId },

    #[error("pseudo-inverse failed: {0}")]
    PseudoInverse(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Reject NaN and infinite values
pub(crate) fn require_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoringError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}

pub(crate) fn require_finite_point(name: &'static str, point: Point<f64>) -> Result<Point<f64>> {
    require_finite(name, point.x())?;
    require_finite(name, point.y())?;
    Ok(point)
}

/// Reject NaN, infinite and non-positive values
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64> {
    require_finite(name, value)?;
    if value <= 0.0 {
        return Err(ScoringError::InvalidParameter {
            name,
            value,
            reason: "must be > 0",
        });
    }
    Ok(value)
}

/// Reject NaN, infinite and negative values
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> Result<f64> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(ScoringError::InvalidParameter {
            name,
            value,
            reason: "must be >= 0",
        });
    }
    Ok(value)
}
