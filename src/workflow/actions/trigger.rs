use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    model::NodeModel,
    runtime::Context,
    workflow::{actions::ActionKind, node::NodeId},
};

use super::Action;

/// The entry point of a graph.
///
/// A real deployment would receive the external event here (a submitted
/// form, an incoming webhook). This stand-in ignores its parameters and
/// emits a fixed synthetic form submission so downstream nodes have data
/// to chew on.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TriggerAction {
    label: String,
}

#[async_trait]
#[typetag::serde]
impl Action for TriggerAction {
    fn create(model: &NodeModel) -> Result<Self> {
        Ok(TriggerAction {
            label: model.data.label.clone(),
        })
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Trigger
    }

    async fn run(
        &self,
        _: Arc<Context>,
        nid: NodeId,
        _: &Vars,
    ) -> Result<Vars> {
        let mut out = Vars::new();
        out.set(
            nid,
            json!({
                "event": "form_submitted",
                "form": {
                    "name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "message": "I would like a demo"
                }
            }),
        );
        Ok(out)
    }
}
