//! Compiled runtime graph.
//!
//! Wraps the persisted graph configuration in a directed graph (petgraph)
//! the walker traverses. Unlike the stored model, the compiled graph is
//! immutable for the whole run; per-run execution state lives in the
//! walker's visited set.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use tracing::warn;

use crate::{
    FlowletError, Result,
    model::GraphModel,
    workflow::{
        actions::ActionKind,
        edge::Edge,
        node::{Node, NodeId},
    },
};

/// Runtime workflow graph.
pub struct Graph {
    graph: DiGraph<Node, Edge>,
    index: HashMap<NodeId, NodeIndex>,
    trigger: Option<NodeId>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.graph.node_count())
            .field("edge_count", &self.graph.edge_count())
            .field("trigger", &self.trigger)
            .finish()
    }
}

#[allow(unused)]
impl Graph {
    /// Node count of the compiled graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a node by id.
    pub fn get_node(
        &self,
        id: &NodeId,
    ) -> Option<&Node> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// The graph's entry point: the first node in array order whose type
    /// is `trigger`. `None` when the configuration has no trigger at all.
    pub fn trigger_node(&self) -> Option<&Node> {
        self.trigger.as_ref().and_then(|id| self.get_node(id))
    }

    /// All outgoing edges of a node, in the order they appear in the
    /// configuration's edges array.
    ///
    /// petgraph iterates outgoing edges in reverse insertion order, so the
    /// stamped `seq` restores the authored order.
    pub fn outgoing_edges(
        &self,
        id: &NodeId,
    ) -> Vec<&Edge> {
        let Some(idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<&Edge> = self.graph.edges_directed(*idx, Direction::Outgoing).map(|e| e.weight()).collect();
        edges.sort_by_key(|e| e.seq);
        edges
    }

    /// Output a human-readable representation of the graph.
    pub fn schema(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Nodes: {}, Edges: {}", self.graph.node_count(), self.graph.edge_count()));
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let outgoing: Vec<String> = self.outgoing_edges(&node.id).iter().map(|e| e.target.clone()).collect();
            if outgoing.is_empty() {
                lines.push(format!("[{}] {} ({}) -> (end)", node.id, node.label, node.kind.as_str()));
            } else {
                lines.push(format!("[{}] {} ({}) -> {}", node.id, node.label, node.kind.as_str(), outgoing.join(", ")));
            }
        }
        lines.join("\n")
    }
}

impl TryFrom<&GraphModel> for Graph {
    type Error = FlowletError;

    fn try_from(model: &GraphModel) -> Result<Self> {
        let mut graph: DiGraph<Node, Edge> = DiGraph::new();
        let mut index = HashMap::new();
        let mut trigger = None;

        for node_model in model.nodes.iter() {
            let node = Node::new(node_model)?;
            if index.contains_key(&node.id) {
                return Err(FlowletError::MalformedConfig(format!("duplicate node id: {}", node.id)));
            }
            if trigger.is_none() && node.kind == ActionKind::Trigger {
                trigger = Some(node.id.clone());
            }
            let nid = node.id.clone();
            let node_idx = graph.add_node(node);
            index.insert(nid, node_idx);
        }

        for (seq, edge_model) in model.edges.iter().enumerate() {
            let (Some(source), Some(target)) = (index.get(&edge_model.source), index.get(&edge_model.target)) else {
                // an edge into a missing node just ends that branch
                warn!("dropping edge {} -> {}: unknown endpoint", edge_model.source, edge_model.target);
                continue;
            };
            graph.add_edge(
                *source,
                *target,
                Edge {
                    source: edge_model.source.clone(),
                    target: edge_model.target.clone(),
                    seq,
                },
            );
        }

        Ok(Self {
            graph,
            index,
            trigger,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{EdgeModel, GraphModel, NodeDataModel, NodeModel};

    use super::*;

    fn node(
        id: &str,
        kind: &str,
    ) -> NodeModel {
        NodeModel {
            id: id.to_string(),
            kind: kind.to_string(),
            data: NodeDataModel {
                label: id.to_uppercase(),
                parameters: Default::default(),
            },
        }
    }

    fn edge(
        source: &str,
        target: &str,
    ) -> EdgeModel {
        EdgeModel {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let model = GraphModel {
            nodes: vec![node("t", "trigger"), node("t", "action")],
            edges: vec![],
        };
        let err = Graph::try_from(&model).unwrap_err();
        assert!(matches!(err, FlowletError::MalformedConfig(_)));
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let model = GraphModel {
            nodes: vec![node("t", "trigger"), node("a", "action")],
            edges: vec![edge("t", "a"), edge("a", "ghost")],
        };
        let graph = Graph::try_from(&model).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.outgoing_edges(&"a".to_string()).is_empty());
    }

    #[test]
    fn first_trigger_in_array_order_wins() {
        let model = GraphModel {
            nodes: vec![node("a", "action"), node("t1", "trigger"), node("t2", "trigger")],
            edges: vec![],
        };
        let graph = Graph::try_from(&model).unwrap();
        assert_eq!(graph.trigger_node().unwrap().id, "t1");
    }

    #[test]
    fn missing_trigger_compiles_but_is_reported_absent() {
        let model = GraphModel {
            nodes: vec![node("a", "action")],
            edges: vec![],
        };
        let graph = Graph::try_from(&model).unwrap();
        assert!(graph.trigger_node().is_none());
    }

    #[test]
    fn outgoing_edges_follow_array_order() {
        let model = GraphModel {
            nodes: vec![node("t", "trigger"), node("b", "action"), node("c", "action"), node("d", "action")],
            edges: vec![edge("t", "b"), edge("t", "c"), edge("t", "d")],
        };
        let graph = Graph::try_from(&model).unwrap();
        let targets: Vec<&str> = graph.outgoing_edges(&"t".to_string()).iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["b", "c", "d"]);
    }
}
