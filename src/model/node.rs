use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One node of a persisted graph configuration.
///
/// `type` is kept as a plain string at this layer; it is resolved into an
/// action kind when the graph is compiled, so documents with unrecognized
/// node types still load and fail at execution time instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeModel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: NodeDataModel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeDataModel {
    pub label: String,
    #[serde(default)]
    pub parameters: HashMap<String, ParamValue>,
}

/// A node parameter value.
///
/// The builder UI only produces strings, numbers and booleans; keeping the
/// set closed keeps action dispatch exhaustive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value.into())
    }
}
