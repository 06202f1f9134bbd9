use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    model::{NodeDataModel, NodeModel, ParamValue},
    workflow::actions::{Action, ActionKind, create_action},
};

/// node id
pub type NodeId = String;

/// Runtime representation of one graph node: the model fields plus the
/// action instance that executes it.
#[derive(Serialize, Deserialize)]
pub struct Node {
    /// node id
    pub id: NodeId,
    /// display label, used in the run's log trace
    pub label: String,
    /// resolved node kind
    pub kind: ActionKind,
    /// declared parameters
    pub params: HashMap<String, ParamValue>,
    /// node action
    pub action: Box<dyn Action>,
}

impl Clone for Node {
    fn clone(&self) -> Self {
        // recreating from the model cannot fail once the node was built
        let action = create_action(&self.to_model()).unwrap();

        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            kind: self.kind.clone(),
            params: self.params.clone(),
            action,
        }
    }
}

impl Node {
    pub fn new(model: &NodeModel) -> Result<Self> {
        let action = create_action(model)?;

        Ok(Self {
            id: model.id.clone(),
            label: model.data.label.clone(),
            kind: ActionKind::parse(&model.kind),
            params: model.data.parameters.clone(),
            action,
        })
    }

    fn to_model(&self) -> NodeModel {
        NodeModel {
            id: self.id.clone(),
            kind: self.kind.as_str().to_string(),
            data: NodeDataModel {
                label: self.label.clone(),
                parameters: self.params.clone(),
            },
        }
    }
}
