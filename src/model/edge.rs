use serde::{Deserialize, Serialize};

/// A directed connection from one node's output to another node's input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EdgeModel {
    pub source: String,
    pub target: String,
}
