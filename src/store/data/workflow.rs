use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// A persisted workflow document.
///
/// `config` holds the graph configuration as the JSON string the builder
/// saved; `status` is one of the `WorkflowStatus` names.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Workflow {
    pub id: String,
    /// owning organization
    pub oid: String,
    pub name: String,
    pub desc: String,
    /// the prompt text this workflow was generated from, if any
    pub prompt: String,
    pub category: String,
    pub status: String,
    /// serialized graph configuration (nodes + edges)
    pub config: String,
    pub create_time: i64,
    pub update_time: i64,
}

impl DbCollectionIden for Workflow {
    fn iden() -> StoreIden {
        StoreIden::Workflows
    }
}
