pub mod linalg;

pub use linalg::*;

use geo::{Line, Point};
use serde::{Deserialize, Serialize};

/// OSM identifier of a way
pub type WayId = i64;

/// Candidate road geometry returned by the road-network store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub osm_id: WayId,
    pub points: Vec<Point<f64>>,
}

impl Way {
    pub fn new(osm_id: WayId, points: Vec<Point<f64>>) -> Self {
        Way { osm_id, points }
    }

    /// Build a way from raw `(x, y)` pairs
    pub fn from_xy(osm_id: WayId, coords: &[(f64, f64)]) -> Self {
        let points = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Way { osm_id, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the first vertex with a NaN or infinite coordinate
    pub fn first_non_finite(&self) -> Option<usize> {
        self.points
            .iter()
            .position(|p| !p.x().is_finite() || !p.y().is_finite())
    }

    /// Consecutive vertex pairs as directed segments
    pub fn segments(&self) -> impl Iterator<Item = Line<f64>> + '_ {
        self.points
            .windows(2)
            .map(|pair| Line::new(pair[0], pair[1]))
    }
}

/// A single GPS fix. Heading is in radians when the receiver reports one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpsObservation {
    pub point: Point<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
}

impl GpsObservation {
    pub fn new(point: Point<f64>, heading: Option<f64>) -> Self {
        GpsObservation { point, heading }
    }
}

/// Candidate segment tagged with caller-defined origin identifiers.
///
/// `start` and `end` are typically vertex indices or way ids; scorers only
/// look at `segment` and never interpret the tags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OriginSegment<S, E = S> {
    pub start: S,
    pub end: E,
    pub segment: Line<f64>,
}

impl<S, E> OriginSegment<S, E> {
    pub fn new(start: S, end: E, segment: Line<f64>) -> Self {
        OriginSegment {
            start,
            end,
            segment,
        }
    }
}

impl OriginSegment<usize> {
    /// Segments between consecutive vertices of `way`, tagged with vertex indices
    pub fn from_way(way: &Way) -> Vec<Self> {
        way.segments()
            .enumerate()
            .map(|(i, segment)| OriginSegment::new(i, i + 1, segment))
            .collect()
    }
}
