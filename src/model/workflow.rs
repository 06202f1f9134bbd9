use serde::{Deserialize, Serialize};

use crate::{
    FlowletError, Result,
    model::GraphModel,
};

/// Lifecycle status of a workflow document.
///
/// Only `active` workflows may be run. `failed` is set externally when the
/// owning application decides a workflow is beyond retry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Failed,
}

/// A workflow document as authored in the builder UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowModel {
    pub id: String,
    /// owning organization
    pub oid: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// the prompt text this workflow was generated from, if any
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: WorkflowStatus,
    pub graph: GraphModel,
}

impl WorkflowModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let workflow = serde_json::from_str::<WorkflowModel>(s);
        match workflow {
            Ok(v) => Ok(v),
            Err(e) => Err(FlowletError::Workflow(format!("{}", e))),
        }
    }
}
