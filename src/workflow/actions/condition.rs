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

/// A `condition` node.
///
/// No expression is evaluated: the condition is always met and the walker
/// follows every outgoing edge regardless. The marker and parameters are
/// still merged into the data stream so downstream nodes can see which
/// condition was on their path.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConditionAction {
    label: String,
    params: HashMap<String, ParamValue>,
}

#[async_trait]
#[typetag::serde]
impl Action for ConditionAction {
    fn create(model: &NodeModel) -> Result<Self> {
        Ok(ConditionAction {
            label: model.data.label.clone(),
            params: model.data.parameters.clone(),
        })
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Condition
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
                "condition": self.label,
                "met": true,
                "parameters": self.params
            }),
        );
        Ok(out)
    }
}
