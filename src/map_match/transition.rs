//! Transition likelihoods between candidate segments of consecutive fixes
//!
//! `score(i, j) = exp(-beta * gap(i, j))` where `gap` is the four-way
//! endpoint-to-segment minimum from [`segment_gap`].

use geo::Line;
use log::{debug, trace};
use ndarray::{Array2, ArrayView1};

use crate::config::{ScoringConfig, DEFAULT_TRANSITION_BETA};
use crate::error::{require_positive, Result, ScoringError};
use crate::map_match::geometry::segment_gap;
use crate::types::OriginSegment;

/// Score matrix, rows follow the first segment set and columns the second
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionScores {
    scores: Array2<f64>,
}

impl TransitionScores {
    /// `(len(segments1), len(segments2))`
    pub fn shape(&self) -> (usize, usize) {
        self.scores.dim()
    }

    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.scores.get((from, to)).copied()
    }

    /// Scores from one segment of the earlier fix to every later candidate
    pub fn row(&self, from: usize) -> ArrayView1<'_, f64> {
        self.scores.row(from)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn into_array(self) -> Array2<f64> {
        self.scores
    }

    /// Nested rows, for decoders that don't use ndarray
    pub fn to_vec(&self) -> Vec<Vec<f64>> {
        self.scores.outer_iter().map(|row| row.to_vec()).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionScorer {
    beta: f64,
}

impl Default for TransitionScorer {
    fn default() -> Self {
        TransitionScorer {
            beta: DEFAULT_TRANSITION_BETA,
        }
    }
}

impl TransitionScorer {
    /// `beta` is the decay rate per unit of segment gap
    pub fn new(beta: f64) -> Result<Self> {
        let beta = require_positive("transition_beta", beta)?;
        Ok(TransitionScorer { beta })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::new(config.transition_beta)
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Likelihood of moving from `from` to `to`, in `(0, 1]`
    pub fn pair_score(&self, from: &Line<f64>, to: &Line<f64>) -> Result<f64> {
        check_segment("from", 0, from)?;
        check_segment("to", 0, to)?;
        Ok(self.decay(from, to))
    }

    /// Score every pair of tagged candidates; the tags are ignored
    pub fn score<S1, E1, S2, E2>(
        &self,
        segments1: &[OriginSegment<S1, E1>],
        segments2: &[OriginSegment<S2, E2>],
    ) -> Result<TransitionScores> {
        let lines1: Vec<Line<f64>> = segments1.iter().map(|s| s.segment).collect();
        let lines2: Vec<Line<f64>> = segments2.iter().map(|s| s.segment).collect();
        self.score_segments(&lines1, &lines2)
    }

    /// Score every pair of bare segments
    pub fn score_segments(
        &self,
        segments1: &[Line<f64>],
        segments2: &[Line<f64>],
    ) -> Result<TransitionScores> {
        for (index, segment) in segments1.iter().enumerate() {
            check_segment("segments1", index, segment)?;
        }
        for (index, segment) in segments2.iter().enumerate() {
            check_segment("segments2", index, segment)?;
        }

        if segments1.is_empty() || segments2.is_empty() {
            debug!(
                "Empty transition candidate set ({} x {})",
                segments1.len(),
                segments2.len()
            );
        }

        let scores = Array2::from_shape_fn((segments1.len(), segments2.len()), |(i, j)| {
            self.decay(&segments1[i], &segments2[j])
        });

        trace!(
            "Scored {}x{} transitions (beta={})",
            segments1.len(),
            segments2.len(),
            self.beta
        );
        Ok(TransitionScores { scores })
    }

    fn decay(&self, from: &Line<f64>, to: &Line<f64>) -> f64 {
        (-self.beta * segment_gap(from, to)).exp()
    }
}

/// Endpoints must be finite before `segment_gap`, whose `min` ignores NaN
fn check_segment(set: &'static str, index: usize, segment: &Line<f64>) -> Result<()> {
    let coords = [segment.start, segment.end];
    if coords.iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        Ok(())
    } else {
        Err(ScoringError::NonFiniteSegment { set, index })
    }
}
