use geo::Point;
use log::debug;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::error::{require_finite_point, require_non_negative, Result, ScoringError};
use crate::types::{Way, WayId};

/// Way vertex position tagged with (way slot, vertex index)
type IndexedNode = GeomWithData<[f64; 2], (usize, usize)>;

/// Vertices of one way that fall inside the search radius
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesWithinRadius {
    pub osm_id: WayId,
    pub indices: Vec<usize>,
}

/// R-Tree over every vertex of a candidate way set
///
/// # Architecture
/// - One entry per vertex, tagged with its way's position in the input
///   slice and its index along the way
/// - Radius queries return one [`NodesWithinRadius`] per way, in input
///   order, even when a way has no vertex in range
///
/// # Usage
/// ```
/// use geo::Point;
/// use map_match_scoring::map_match::WayNodeIndex;
/// use map_match_scoring::types::Way;
///
/// let ways = vec![Way::from_xy(1, &[(0.0, 0.0), (10.0, 0.0), (100.0, 0.0)])];
/// let index = WayNodeIndex::from_ways(&ways).unwrap();
///
/// let nodes = index.within_radius(Point::new(0.0, 0.0), 50.0).unwrap();
/// assert_eq!(nodes[0].indices, vec![0, 1]);
/// ```
pub struct WayNodeIndex {
    tree: RTree<IndexedNode>,
    way_ids: Vec<WayId>,
}

impl WayNodeIndex {
    /// Index every vertex of `ways`
    pub fn from_ways(ways: &[Way]) -> Result<Self> {
        let mut nodes = Vec::with_capacity(ways.iter().map(Way::len).sum());

        for (slot, way) in ways.iter().enumerate() {
            if let Some(index) = way.first_non_finite() {
                return Err(ScoringError::NonFiniteCoordinate {
                    osm_id: way.osm_id,
                    index,
                });
            }
            nodes.extend(
                way.points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| IndexedNode::new([p.x(), p.y()], (slot, i))),
            );
        }

        Ok(WayNodeIndex {
            tree: RTree::bulk_load(nodes),
            way_ids: ways.iter().map(|way| way.osm_id).collect(),
        })
    }

    /// Total vertices in tree
    pub fn node_count(&self) -> usize {
        self.tree.size()
    }

    pub fn way_count(&self) -> usize {
        self.way_ids.len()
    }

    /// Vertices within `radius` (inclusive) of `base_point`, grouped per way.
    ///
    /// Indices within each group are ascending.
    pub fn within_radius(
        &self,
        base_point: Point<f64>,
        radius: f64,
    ) -> Result<Vec<NodesWithinRadius>> {
        let base_point = require_finite_point("base_point", base_point)?;
        let radius = require_non_negative("radius", radius)?;

        let mut results: Vec<NodesWithinRadius> = self
            .way_ids
            .iter()
            .map(|&osm_id| NodesWithinRadius {
                osm_id,
                indices: Vec::new(),
            })
            .collect();

        for node in self
            .tree
            .locate_within_distance([base_point.x(), base_point.y()], radius * radius)
        {
            let (slot, index) = node.data;
            results[slot].indices.push(index);
        }

        for nodes in &mut results {
            nodes.indices.sort_unstable();
        }

        let hits: usize = results.iter().map(|n| n.indices.len()).sum();
        if hits == 0 {
            debug!(
                "No way nodes within {}m of ({}, {})",
                radius,
                base_point.x(),
                base_point.y()
            );
        }

        Ok(results)
    }
}

/// One-shot radius pre-filter over `ways`
pub fn indices_of_nodes_within_radius(
    base_point: Point<f64>,
    ways: &[Way],
    radius: f64,
) -> Result<Vec<NodesWithinRadius>> {
    WayNodeIndex::from_ways(ways)?.within_radius(base_point, radius)
}
