use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    model::{NodeModel, ParamValue},
    runtime::Context,
    workflow::{actions::ActionKind, node::NodeId},
};

use super::Action;

/// An `action` node: the stand-in for calling an integration.
///
/// Records which action ran and its declared parameters under the node's
/// id, keeping fan-in payloads from different branches distinguishable.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServiceAction {
    label: String,
    params: HashMap<String, ParamValue>,
}

#[async_trait]
#[typetag::serde]
impl Action for ServiceAction {
    fn create(model: &NodeModel) -> Result<Self> {
        Ok(ServiceAction {
            label: model.data.label.clone(),
            params: model.data.parameters.clone(),
        })
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Action
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
                "action": self.label,
                "parameters": self.params,
                "completed": true
            }),
        );
        Ok(out)
    }
}
