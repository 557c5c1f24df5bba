//! Emission features for candidate way vertices
//!
//! Two independent per-vertex likelihoods are produced:
//! - distance score: Gaussian density of the GPS-to-vertex distance
//! - tangent score: `cos²` of the angle between road heading and GPS heading
//!
//! They are returned separately inside a [`WayFeatures`] bundle; combining
//! them into one emission probability is left to the decoder.

use geo::Point;
use log::trace;
use serde::Serialize;
use std::f64::consts::PI;

use crate::config::{ScoringConfig, DEFAULT_GPS_SIGMA};
use crate::error::{
    require_finite, require_finite_point, require_positive, Result, ScoringError,
};
use crate::map_match::geometry::point_distance;
use crate::map_match::heading::HeadingEstimator;
use crate::types::{GpsObservation, Way, WayId};

/// Directional likelihood in `[0, 1]`.
///
/// 1 when the road heading is parallel or antiparallel to `base_angle`,
/// 0 when perpendicular.
pub fn tangent_score(angle: f64, base_angle: f64) -> f64 {
    (angle - base_angle).cos().powi(2)
}

/// Zero-mean normal density with standard deviation `sigma`, evaluated at `distance`.
///
/// This is a density, not a probability: it peaks at `1 / (sqrt(2π)·σ)`.
/// `sigma` must be finite and > 0.
pub fn gaussian_pdf(distance: f64, sigma: f64) -> Result<f64> {
    let sigma = require_positive("gps_sigma", sigma)?;
    let distance = require_finite("distance", distance)?;
    Ok(normal_density(distance, sigma))
}

/// Density for an already validated `sigma`
fn normal_density(distance: f64, sigma: f64) -> f64 {
    let z = distance / sigma;
    (1.0 / ((2.0 * PI).sqrt() * sigma)) * (-0.5 * z * z).exp()
}

/// Per-vertex features derived for one way.
///
/// Each sequence is optional and, once present, has exactly one entry per
/// vertex of the way it was built from. Bundles are never mutated in place:
/// every `with_*` call consumes the bundle and returns a new one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WayFeatures {
    osm_id: WayId,
    point_count: usize,
    distances: Option<Vec<f64>>,
    angles: Option<Vec<f64>>,
    tangent_scores: Option<Vec<f64>>,
    distance_scores: Option<Vec<f64>>,
}

impl WayFeatures {
    /// Empty bundle for `way`
    pub fn new(way: &Way) -> Self {
        WayFeatures {
            osm_id: way.osm_id,
            point_count: way.len(),
            distances: None,
            angles: None,
            tangent_scores: None,
            distance_scores: None,
        }
    }

    pub fn osm_id(&self) -> WayId {
        self.osm_id
    }

    pub fn len(&self) -> usize {
        self.point_count
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// Distance of each vertex from the GPS fix (meters)
    pub fn distances(&self) -> Option<&[f64]> {
        self.distances.as_deref()
    }

    /// Local road heading at each vertex (radians)
    pub fn angles(&self) -> Option<&[f64]> {
        self.angles.as_deref()
    }

    pub fn tangent_scores(&self) -> Option<&[f64]> {
        self.tangent_scores.as_deref()
    }

    pub fn distance_scores(&self) -> Option<&[f64]> {
        self.distance_scores.as_deref()
    }

    pub fn with_distances(mut self, distances: Vec<f64>) -> Result<Self> {
        self.check_len("distances", &distances)?;
        self.distances = Some(distances);
        Ok(self)
    }

    pub fn with_angles(mut self, angles: Vec<f64>) -> Result<Self> {
        self.check_len("angles", &angles)?;
        self.angles = Some(angles);
        Ok(self)
    }

    pub fn with_tangent_scores(mut self, scores: Vec<f64>) -> Result<Self> {
        self.check_len("tangent_scores", &scores)?;
        self.tangent_scores = Some(scores);
        Ok(self)
    }

    pub fn with_distance_scores(mut self, scores: Vec<f64>) -> Result<Self> {
        self.check_len("distance_scores", &scores)?;
        self.distance_scores = Some(scores);
        Ok(self)
    }

    fn check_len(&self, feature: &'static str, values: &[f64]) -> Result<()> {
        if values.len() != self.point_count {
            return Err(ScoringError::LengthMismatch {
                osm_id: self.osm_id,
                feature,
                expected: self.point_count,
                found: values.len(),
            });
        }
        Ok(())
    }

    fn check_way(&self, way: &Way) -> Result<()> {
        if self.osm_id != way.osm_id {
            return Err(ScoringError::WayMismatch {
                expected: way.osm_id,
                found: self.osm_id,
            });
        }
        if self.point_count != way.len() {
            return Err(ScoringError::LengthMismatch {
                osm_id: way.osm_id,
                feature: "points",
                expected: way.len(),
                found: self.point_count,
            });
        }
        Ok(())
    }

    fn missing(&self, feature: &'static str) -> ScoringError {
        ScoringError::MissingFeature {
            osm_id: self.osm_id,
            feature,
        }
    }
}

/// Emission feature generator
///
/// # Usage
/// ```
/// use geo::Point;
/// use map_match_scoring::map_match::EmissionScorer;
/// use map_match_scoring::types::{GpsObservation, Way};
///
/// let scorer = EmissionScorer::default();
/// let way = Way::from_xy(1, &[(0.0, 0.0), (3.0, 0.0), (6.0, 0.0)]);
/// let fix = GpsObservation::new(Point::new(3.0, 1.0), Some(0.0));
///
/// let features = scorer.score_way(&way, &fix).unwrap();
/// assert_eq!(features.distance_scores().unwrap().len(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmissionScorer {
    gps_sigma: f64,
    heading: HeadingEstimator,
}

impl Default for EmissionScorer {
    fn default() -> Self {
        EmissionScorer {
            gps_sigma: DEFAULT_GPS_SIGMA,
            heading: HeadingEstimator::default(),
        }
    }
}

impl EmissionScorer {
    pub fn new(gps_sigma: f64, heading: HeadingEstimator) -> Result<Self> {
        let gps_sigma = require_positive("gps_sigma", gps_sigma)?;
        Ok(EmissionScorer { gps_sigma, heading })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::new(config.gps_sigma, HeadingEstimator::from_config(config)?)
    }

    pub fn gps_sigma(&self) -> f64 {
        self.gps_sigma
    }

    pub fn heading_estimator(&self) -> &HeadingEstimator {
        &self.heading
    }

    /// Attach the distance of every vertex from `base_point`
    pub fn add_distances(
        &self,
        way: &Way,
        features: WayFeatures,
        base_point: Point<f64>,
    ) -> Result<WayFeatures> {
        features.check_way(way)?;
        let base_point = require_finite_point("base_point", base_point)?;
        if let Some(index) = way.first_non_finite() {
            return Err(ScoringError::NonFiniteCoordinate {
                osm_id: way.osm_id,
                index,
            });
        }

        let distances = way
            .points
            .iter()
            .map(|point| point_distance(*point, base_point))
            .collect();
        features.with_distances(distances)
    }

    /// Attach the LWR heading estimate of every vertex
    pub fn add_tangents(&self, way: &Way, features: WayFeatures) -> Result<WayFeatures> {
        features.check_way(way)?;
        let angles = self.heading.angles(way)?;
        features.with_angles(angles)
    }

    /// Score every heading against the GPS travel heading `base_angle`
    pub fn add_tangent_scores(
        &self,
        features: WayFeatures,
        base_angle: f64,
    ) -> Result<WayFeatures> {
        let base_angle = require_finite("base_angle", base_angle)?;
        let angles = features.angles().ok_or_else(|| features.missing("angles"))?;

        let scores = angles
            .iter()
            .map(|angle| tangent_score(*angle, base_angle))
            .collect();
        features.with_tangent_scores(scores)
    }

    /// Evaluate the GPS noise density at every vertex distance
    pub fn add_distance_scores(&self, features: WayFeatures) -> Result<WayFeatures> {
        let distances = features
            .distances()
            .ok_or_else(|| features.missing("distances"))?;

        let scores = distances
            .iter()
            .map(|distance| normal_density(*distance, self.gps_sigma))
            .collect();
        features.with_distance_scores(scores)
    }

    /// All features for one way.
    ///
    /// Tangent scores are only produced when the observation has a heading.
    pub fn score_way(&self, way: &Way, observation: &GpsObservation) -> Result<WayFeatures> {
        let features = WayFeatures::new(way);
        let features = self.add_distances(way, features, observation.point)?;
        let features = self.add_tangents(way, features)?;
        let features = match observation.heading {
            Some(base_angle) => self.add_tangent_scores(features, base_angle)?,
            None => features,
        };
        let features = self.add_distance_scores(features)?;

        trace!(
            "Way {}: scored {} points (sigma={}, heading={:?})",
            way.osm_id,
            features.len(),
            self.gps_sigma,
            observation.heading
        );
        Ok(features)
    }

    /// [`score_way`](Self::score_way) for each way, in input order
    pub fn score_ways(
        &self,
        ways: &[Way],
        observation: &GpsObservation,
    ) -> Result<Vec<WayFeatures>> {
        ways.iter().map(|way| self.score_way(way, observation)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::FRAC_PI_2;

    fn straight_way() -> Way {
        Way::from_xy(10, &[(0.0, 0.0), (3.0, 0.0), (6.0, 0.0)])
    }

    #[test]
    fn test_gaussian_pdf_at_one_sigma() {
        let expected = (1.0 / ((2.0 * PI).sqrt() * 3.0)) * (-0.5_f64).exp();
        let density = gaussian_pdf(3.0, 3.0).unwrap();

        assert_relative_eq!(density, expected, max_relative = 1e-12);
        assert_relative_eq!(density, 0.24197072451914337 / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn test_gaussian_pdf_rejects_bad_sigma() {
        for sigma in [-3.0, 0.0, f64::NAN, f64::INFINITY] {
            let err = gaussian_pdf(1.0, sigma).unwrap_err();
            assert!(matches!(
                err,
                ScoringError::InvalidParameter { name: "gps_sigma", .. }
            ));
        }
        assert!(gaussian_pdf(f64::NAN, 3.0).is_err());
    }

    #[test]
    fn test_gaussian_pdf_peaks_at_zero_and_decreases() {
        let sigma = 3.0;
        let mut previous = gaussian_pdf(0.0, sigma).unwrap();
        let peak = 1.0 / ((2.0 * PI).sqrt() * sigma);
        assert_relative_eq!(previous, peak, max_relative = 1e-12);

        for step in 1..40 {
            let current = gaussian_pdf(step as f64 * 0.5, sigma).unwrap();
            assert!(current < previous);
            previous = current;
        }
    }

    #[test]
    fn test_tangent_score_bounds() {
        assert_abs_diff_eq!(tangent_score(0.3, 0.3), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tangent_score(0.3 + PI, 0.3), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tangent_score(0.3 + FRAC_PI_2, 0.3), 0.0, epsilon = 1e-12);

        for i in 0..100 {
            let score = tangent_score(i as f64 * 0.137, -1.2);
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_distance_score_scenario() {
        let scorer = EmissionScorer::new(3.0, HeadingEstimator::default()).unwrap();
        let way = Way::from_xy(1, &[(3.0, 0.0)]);

        let features = scorer
            .add_distances(&way, WayFeatures::new(&way), Point::new(0.0, 0.0))
            .unwrap();
        let features = scorer.add_distance_scores(features).unwrap();

        let expected = (1.0 / ((2.0 * PI).sqrt() * 3.0)) * (-0.5_f64).exp();
        assert_eq!(features.distances(), Some(&[3.0][..]));
        assert_relative_eq!(features.distance_scores().unwrap()[0], expected, max_relative = 1e-12);
    }

    #[test]
    fn test_score_way_fills_all_features() {
        let scorer = EmissionScorer::default();
        let way = straight_way();
        let fix = GpsObservation::new(Point::new(3.0, 4.0), Some(0.0));

        let features = scorer.score_way(&way, &fix).unwrap();

        assert_eq!(features.osm_id(), 10);
        assert_eq!(features.len(), 3);
        for feature in [
            features.distances(),
            features.angles(),
            features.tangent_scores(),
            features.distance_scores(),
        ] {
            assert_eq!(feature.map(|f| f.len()), Some(3));
        }

        let distances = features.distances().unwrap();
        assert_abs_diff_eq!(distances[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(distances[1], 4.0, epsilon = 1e-12);

        // Road runs along +x, travel heading is +x
        for score in features.tangent_scores().unwrap() {
            assert_abs_diff_eq!(*score, 1.0, epsilon = 1e-12);
        }

        // Closest vertex scores highest
        let scores = features.distance_scores().unwrap();
        assert!(scores[1] > scores[0]);
        assert_abs_diff_eq!(scores[0], scores[2], epsilon = 1e-15);
    }

    #[test]
    fn test_perpendicular_travel_heading() {
        let scorer = EmissionScorer::default();
        let fix = GpsObservation::new(Point::new(3.0, 0.0), Some(FRAC_PI_2));

        let features = scorer.score_way(&straight_way(), &fix).unwrap();
        for score in features.tangent_scores().unwrap() {
            assert_abs_diff_eq!(*score, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_no_heading_skips_tangent_scores() {
        let scorer = EmissionScorer::default();
        let fix = GpsObservation::new(Point::new(0.0, 1.0), None);

        let features = scorer.score_way(&straight_way(), &fix).unwrap();
        assert!(features.angles().is_some());
        assert!(features.tangent_scores().is_none());
        assert!(features.distance_scores().is_some());
    }

    #[test]
    fn test_single_point_way_scores() {
        let scorer = EmissionScorer::default();
        let way = Way::from_xy(4, &[(1.0, 1.0)]);
        let fix = GpsObservation::new(Point::new(1.0, 1.0), Some(0.0));

        let features = scorer.score_way(&way, &fix).unwrap();
        assert_eq!(features.angles(), Some(&[0.0][..]));
        assert_eq!(features.tangent_scores(), Some(&[1.0][..]));
    }

    #[test]
    fn test_empty_way_fails() {
        let scorer = EmissionScorer::default();
        let way = Way::new(5, vec![]);
        let fix = GpsObservation::new(Point::new(0.0, 0.0), Some(0.0));

        let err = scorer.score_way(&way, &fix).unwrap_err();
        assert_eq!(err, ScoringError::EmptyWay { osm_id: 5 });
    }

    #[test]
    fn test_missing_prerequisites() {
        let scorer = EmissionScorer::default();
        let way = straight_way();

        let err = scorer
            .add_tangent_scores(WayFeatures::new(&way), 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            ScoringError::MissingFeature {
                osm_id: 10,
                feature: "angles"
            }
        );

        let err = scorer.add_distance_scores(WayFeatures::new(&way)).unwrap_err();
        assert!(matches!(err, ScoringError::MissingFeature { feature: "distances", .. }));
    }

    #[test]
    fn test_features_from_other_way_rejected() {
        let scorer = EmissionScorer::default();
        let other = Way::from_xy(11, &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);

        let err = scorer
            .add_tangents(&straight_way(), WayFeatures::new(&other))
            .unwrap_err();
        assert_eq!(err, ScoringError::WayMismatch { expected: 10, found: 11 });
    }

    #[test]
    fn test_with_wrong_length_rejected() {
        let err = WayFeatures::new(&straight_way())
            .with_distances(vec![1.0, 2.0])
            .unwrap_err();
        assert_eq!(
            err,
            ScoringError::LengthMismatch {
                osm_id: 10,
                feature: "distances",
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_incremental_bundles_leave_inputs_untouched() {
        let scorer = EmissionScorer::default();
        let way = straight_way();
        let base = WayFeatures::new(&way);

        let with_distances = scorer
            .add_distances(&way, base.clone(), Point::new(0.0, 0.0))
            .unwrap();
        assert!(base.distances().is_none());
        assert!(with_distances.angles().is_none());

        let with_both = scorer.add_tangents(&way, with_distances.clone()).unwrap();
        assert_eq!(with_both.distances(), with_distances.distances());
        assert!(with_both.angles().is_some());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(EmissionScorer::new(-3.0, HeadingEstimator::default()).is_err());
        assert!(EmissionScorer::new(0.0, HeadingEstimator::default()).is_err());

        let scorer = EmissionScorer::default();
        let way = straight_way();
        assert!(scorer
            .add_distances(&way, WayFeatures::new(&way), Point::new(f64::NAN, 0.0))
            .is_err());

        let features = scorer.add_tangents(&way, WayFeatures::new(&way)).unwrap();
        assert!(scorer.add_tangent_scores(features, f64::INFINITY).is_err());
    }

    #[test]
    fn test_score_ways_preserves_order() {
        let scorer = EmissionScorer::default();
        let ways = vec![
            Way::from_xy(3, &[(0.0, 0.0), (1.0, 1.0)]),
            Way::from_xy(1, &[(5.0, 5.0), (6.0, 5.0), (7.0, 5.0)]),
        ];
        let fix = GpsObservation::new(Point::new(0.0, 0.0), Some(0.0));

        let features = scorer.score_ways(&ways, &fix).unwrap();
        let ids: Vec<WayId> = features.iter().map(|f| f.osm_id()).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(features[1].len(), 3);
    }

    #[test]
    fn test_repeated_scoring_is_identical() {
        let scorer = EmissionScorer::default();
        let way = Way::from_xy(2, &[(0.0, 0.0), (2.0, 1.0), (3.5, 3.0), (4.0, 6.0)]);
        let fix = GpsObservation::new(Point::new(2.5, 2.0), Some(0.7));

        assert_eq!(
            scorer.score_way(&way, &fix).unwrap(),
            scorer.score_way(&way, &fix).unwrap()
        );
    }

    #[test]
    fn test_features_serialize_to_json() {
        let scorer = EmissionScorer::default();
        let fix = GpsObservation::new(Point::new(3.0, 0.0), None);
        let features = scorer.score_way(&straight_way(), &fix).unwrap();

        let json = serde_json::to_value(&features).unwrap();
        assert_eq!(json["osm_id"], 10);
        assert!(json["tangent_scores"].is_null());
        assert_eq!(json["distances"].as_array().map(|a| a.len()), Some(3));
    }
}
