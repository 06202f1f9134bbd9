use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    FlowletError, Result,
    model::{EdgeModel, NodeModel},
};

/// Schema for the persisted graph configuration. Validation runs before
/// deserialization so a malformed document fails with a message pointing
/// at the offending field rather than a serde type error.
static GRAPH_SCHEMA: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    let schema = json!({
        "type": "object",
        "required": ["nodes", "edges"],
        "properties": {
            "nodes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "type", "data"],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "type": { "type": "string", "minLength": 1 },
                        "data": {
                            "type": "object",
                            "required": ["label"],
                            "properties": {
                                "label": { "type": "string" },
                                "parameters": {
                                    "type": "object",
                                    "additionalProperties": {
                                        "type": ["string", "number", "boolean"]
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "edges": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["source", "target"],
                    "properties": {
                        "source": { "type": "string" },
                        "target": { "type": "string" }
                    }
                }
            }
        }
    });
    jsonschema::validator_for(&schema).expect("graph schema is valid")
});

/// The graph configuration embedded in a workflow document: the node list
/// and the directed edges between them, exactly as the builder UI saves
/// them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<NodeModel>,
    pub edges: Vec<EdgeModel>,
}

impl GraphModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(s).map_err(|e| FlowletError::MalformedConfig(format!("{}", e)))?;
        GRAPH_SCHEMA.validate(&value)?;
        let graph = serde_json::from_value::<GraphModel>(value).map_err(|e| FlowletError::MalformedConfig(format!("{}", e)))?;
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{FlowletError, model::ParamValue};

    use super::GraphModel;

    const GRAPH: &str = r#"{
        "nodes": [
            { "id": "t1", "type": "trigger", "data": { "label": "Form Submitted" } },
            { "id": "a1", "type": "action", "data": { "label": "Send Email",
                "parameters": { "to": "ops@example.com", "retries": 2, "html": true } } },
            { "id": "c1", "type": "condition", "data": { "label": "Is Customer" } }
        ],
        "edges": [
            { "source": "t1", "target": "a1" },
            { "source": "a1", "target": "c1" }
        ]
    }"#;

    #[test]
    fn json_round_trip_reproduces_identical_graph() {
        let graph = GraphModel::from_json(GRAPH).unwrap();
        let reloaded = GraphModel::from_json(&graph.to_json().unwrap()).unwrap();
        assert_eq!(graph, reloaded);
        assert_eq!(reloaded.nodes.len(), 3);
        assert_eq!(reloaded.edges.len(), 2);
    }

    #[test]
    fn parameters_keep_their_value_kinds() {
        let graph = GraphModel::from_json(GRAPH).unwrap();
        let params = &graph.nodes[1].data.parameters;
        assert_eq!(params["to"], ParamValue::String("ops@example.com".into()));
        assert_eq!(params["retries"], ParamValue::Number(2.into()));
        assert_eq!(params["html"], ParamValue::Bool(true));
    }

    #[test]
    fn invalid_json_is_malformed_config() {
        let err = GraphModel::from_json("{ not json").unwrap_err();
        assert!(matches!(err, FlowletError::MalformedConfig(_)));
    }

    #[test]
    fn schema_rejects_node_without_id() {
        let err = GraphModel::from_json(r#"{"nodes": [{"type": "trigger", "data": {"label": "x"}}], "edges": []}"#).unwrap_err();
        assert!(matches!(err, FlowletError::MalformedConfig(_)));
    }
}
