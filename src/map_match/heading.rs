//! Local road heading from locally weighted linear regression (LWR)
//!
//! For every vertex of a way, fits `y = beta0 + beta1 * x` to all vertices
//! of the way, weighting each by `exp(-d / (2 * tau²))` where `d` is its
//! distance to the query vertex. The heading is `atan(beta1)`.
//!
//! # Heading ambiguity
//! `atan` maps a slope into `(-π/2, π/2)`, so a road and the same road
//! traversed backwards get the same heading. Travel direction is resolved
//! by the decoder, not here.

use geo::Point;
use log::{debug, trace};

use crate::config::{ScoringConfig, DEFAULT_LWR_TAU};
use crate::error::{require_positive, Result, ScoringError};
use crate::map_match::geometry::point_distance;
use crate::types::{NormalMatrix, RegressionVec, Way, INTERCEPT, PINV_RCOND, SLOPE};

/// Heading reported for every vertex of a single-point way.
///
/// One point carries no direction; 0 (along +x) is returned instead of NaN.
pub const SINGLE_POINT_HEADING: f64 = 0.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingEstimator {
    tau: f64,
}

impl Default for HeadingEstimator {
    fn default() -> Self {
        HeadingEstimator {
            tau: DEFAULT_LWR_TAU,
        }
    }
}

impl HeadingEstimator {
    /// Create an estimator with bandwidth `tau`.
    ///
    /// Smaller `tau` makes the fit more local; large `tau` tends to a single
    /// least-squares line through the whole way.
    pub fn new(tau: f64) -> Result<Self> {
        let tau = require_positive("lwr_tau", tau)?;
        Ok(HeadingEstimator { tau })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::new(config.lwr_tau)
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Estimated heading (radians, `(-π/2, π/2)`) at every vertex of `way`
    pub fn angles(&self, way: &Way) -> Result<Vec<f64>> {
        let frame = CenteredWay::new(way)?;

        if way.len() == 1 {
            debug!(
                "Way {} has a single point, using sentinel heading {}",
                way.osm_id, SINGLE_POINT_HEADING
            );
            return Ok(vec![SINGLE_POINT_HEADING]);
        }

        let angles = (0..way.len())
            .map(|index| self.regress(&way.points, &frame, index).map(f64::atan))
            .collect::<Result<Vec<f64>>>()?;

        trace!("Way {}: {} headings (tau={})", way.osm_id, angles.len(), self.tau);
        Ok(angles)
    }

    /// Estimated heading at a single vertex
    pub fn angle_at(&self, way: &Way, index: usize) -> Result<f64> {
        self.slope_at(way, index).map(f64::atan)
    }

    /// Locally weighted slope `dy/dx` at a single vertex
    pub fn slope_at(&self, way: &Way, index: usize) -> Result<f64> {
        let frame = CenteredWay::new(way)?;

        if index >= way.len() {
            return Err(ScoringError::IndexOutOfBounds {
                index,
                len: way.len(),
            });
        }
        if way.len() == 1 {
            return Ok(SINGLE_POINT_HEADING.tan());
        }

        self.regress(&way.points, &frame, index)
    }

    /// Solve the weighted normal equations around `points[index]`
    ///
    /// # Algorithm
    /// Design matrix `X = [x - mean(x), 1]`, target `Y = y - mean(y)`,
    /// `W = diag(w)`. Returns `beta1` of `pinv(XᵀWX) · XᵀWY`.
    fn regress(&self, points: &[Point<f64>], frame: &CenteredWay, index: usize) -> Result<f64> {
        let query = points[index];
        let bandwidth = 2.0 * self.tau * self.tau;

        let mut normal = NormalMatrix::zeros();
        let mut rhs = RegressionVec::zeros();

        for ((point, &xc), &yc) in points.iter().zip(&frame.xs).zip(&frame.ys) {
            let w = (-point_distance(query, *point) / bandwidth).exp();

            normal[(SLOPE, SLOPE)] += w * xc * xc;
            normal[(SLOPE, INTERCEPT)] += w * xc;
            normal[(INTERCEPT, INTERCEPT)] += w;

            rhs[SLOPE] += w * xc * yc;
            rhs[INTERCEPT] += w * yc;
        }
        normal[(INTERCEPT, SLOPE)] = normal[(SLOPE, INTERCEPT)];

        let betas = pseudo_inverse(normal)? * rhs;
        Ok(betas[SLOPE])
    }
}

/// Moore–Penrose pseudo-inverse through SVD.
///
/// Singular values at or below `PINV_RCOND * σ_max` are dropped, which keeps
/// collinear or vertical geometry finite instead of dividing by ~0.
fn pseudo_inverse(matrix: NormalMatrix) -> Result<NormalMatrix> {
    let svd = matrix.svd(true, true);
    let cutoff = svd.singular_values.max() * PINV_RCOND;
    svd.pseudo_inverse(cutoff)
        .map_err(|e| ScoringError::PseudoInverse(e.to_string()))
}

/// Way coordinates shifted onto their means
struct CenteredWay {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl CenteredWay {
    fn new(way: &Way) -> Result<Self> {
        if way.is_empty() {
            return Err(ScoringError::EmptyWay { osm_id: way.osm_id });
        }
        if let Some(index) = way.first_non_finite() {
            return Err(ScoringError::NonFiniteCoordinate {
                osm_id: way.osm_id,
                index,
            });
        }

        let n = way.len() as f64;
        let mean_x = way.points.iter().map(|p| p.x()).sum::<f64>() / n;
        let mean_y = way.points.iter().map(|p| p.y()).sum::<f64>() / n;

        Ok(CenteredWay {
            xs: way.points.iter().map(|p| p.x() - mean_x).collect(),
            ys: way.points.iter().map(|p| p.y() - mean_y).collect(),
        })
    }
}
