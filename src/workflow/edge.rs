//! Runtime edge representation.

use serde::{Deserialize, Serialize};

use crate::workflow::node::NodeId;

/// A directed edge between two compiled nodes.
///
/// `seq` records the edge's position in the configuration's edges array;
/// the walker follows fan-out edges in that order, which makes fan-in
/// arrival order deterministic.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub seq: usize,
}
