mod condition;
mod service;
mod trigger;
mod unknown;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    common::Vars,
    model::NodeModel,
    runtime::Context,
    workflow::node::NodeId,
};

pub use condition::ConditionAction;
pub use service::ServiceAction;
pub use trigger::TriggerAction;
pub use unknown::UnknownAction;

/// Resolved node kind.
///
/// Unrecognized type strings are carried verbatim in `Other`; compiling
/// keeps working and execution fails with an unknown-node-type error when
/// the traversal actually reaches such a node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Trigger,
    Action,
    Condition,
    #[serde(untagged)]
    Other(String),
}

impl ActionKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "trigger" => ActionKind::Trigger,
            "action" => ActionKind::Action,
            "condition" => ActionKind::Condition,
            other => ActionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Trigger => "trigger",
            ActionKind::Action => "action",
            ActionKind::Condition => "condition",
            ActionKind::Other(s) => s.as_str(),
        }
    }
}

/// One executable node behavior.
///
/// Implementations produce the node's output for the accumulated input of
/// the path that reached it. Integrations are simulated: no action calls
/// an external service.
#[async_trait]
#[typetag::serde(tag = "type")]
pub trait Action: Send + Sync {
    /// Creates a new instance of the action from a node model.
    fn create(model: &NodeModel) -> Result<Self>
    where
        Self: Sized;

    /// Returns the kind of the action.
    fn kind(&self) -> ActionKind;

    /// Executes the action with the given context and accumulated input.
    ///
    /// Returns the node's own output; the walker merges it over the input
    /// before following outgoing edges.
    async fn run(
        &self,
        ctx: Arc<Context>,
        nid: NodeId,
        input: &Vars,
    ) -> Result<Vars>;
}

/// Builds the action instance for a node model.
///
/// Dispatch is exhaustive over the closed kind set; anything else becomes
/// an [`UnknownAction`] so the error surfaces during traversal rather than
/// at load time.
pub fn create_action(model: &NodeModel) -> Result<Box<dyn Action>> {
    match ActionKind::parse(&model.kind) {
        ActionKind::Trigger => Ok(Box::new(TriggerAction::create(model)?)),
        ActionKind::Action => Ok(Box::new(ServiceAction::create(model)?)),
        ActionKind::Condition => Ok(Box::new(ConditionAction::create(model)?)),
        ActionKind::Other(_) => Ok(Box::new(UnknownAction::create(model)?)),
    }
}
