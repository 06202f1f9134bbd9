//! Event types for workflow execution.
//!
//! Events are emitted during a run to notify subscribers about state
//! changes, completions, errors, and logs. The engine's monitor projects
//! them into the persisted run/log records.

mod node;
mod workflow;

pub use node::*;
pub use workflow::*;

use crate::{runtime::RunId, workflow::node::NodeId};

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

/// Top-level event type for run graph events.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// Run-level events (start, succeeded, failed, aborted).
    Workflow(WorkflowEvent),
    /// Node-level events (running, succeeded, error).
    Node(NodeEvent),
}

/// Event message containing run and node context.
#[derive(Debug, Clone)]
pub struct Message {
    /// Run that generated this event.
    pub pid: RunId,
    /// Node that generated this event (empty for run-level events).
    pub nid: NodeId,
    /// The actual event data.
    pub event: GraphEvent,
}

/// Log entry emitted during node execution.
#[derive(Debug, Clone)]
pub struct Log {
    /// Run that generated this log.
    pub pid: RunId,
    /// Node that generated this log.
    pub nid: NodeId,
    /// Per-run ordinal, so persisted traces keep execution order.
    pub seq: u64,
    /// Log message content.
    pub content: String,
    /// Timestamp in milliseconds of the log entry.
    pub timestamp: i64,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl GraphEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, GraphEvent::Workflow(WorkflowEvent::Succeeded))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GraphEvent::Workflow(WorkflowEvent::Failed(_)))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GraphEvent::Workflow(WorkflowEvent::Succeeded) | GraphEvent::Workflow(WorkflowEvent::Failed(_)) | GraphEvent::Workflow(WorkflowEvent::Aborted(_))
        )
    }
}
