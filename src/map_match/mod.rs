pub mod emission;
pub mod geometry;
pub mod heading;
pub mod node_index;
pub mod transition;

pub use emission::{gaussian_pdf, tangent_score, EmissionScorer, WayFeatures};
pub use geometry::{point_distance, point_to_segment_distance, segment_gap};
pub use heading::{HeadingEstimator, SINGLE_POINT_HEADING};
pub use node_index::{indices_of_nodes_within_radius, NodesWithinRadius, WayNodeIndex};
pub use transition::{TransitionScorer, TransitionScores};
