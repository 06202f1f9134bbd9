use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    FlowletError, Result,
    common::Vars,
    model::NodeModel,
    runtime::Context,
    workflow::{actions::ActionKind, node::NodeId},
};

use super::Action;

/// Placeholder for a node type this engine does not implement.
///
/// Compiling a graph with such a node succeeds; executing it fails the
/// run. This keeps load-time behavior tolerant of documents written by a
/// newer builder while making the failure explicit instead of a silent
/// fallthrough.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UnknownAction {
    kind: String,
}

#[async_trait]
#[typetag::serde]
impl Action for UnknownAction {
    fn create(model: &NodeModel) -> Result<Self> {
        Ok(UnknownAction {
            kind: model.kind.clone(),
        })
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Other(self.kind.clone())
    }

    async fn run(
        &self,
        _: Arc<Context>,
        _: NodeId,
        _: &Vars,
    ) -> Result<Vars> {
        Err(FlowletError::UnknownNodeType(self.kind.clone()))
    }
}
