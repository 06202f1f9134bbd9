mod collect;
mod r#impl;

use std::{collections::HashMap, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::{
    Result,
    store::{DbCollection, DbStore, Store, data::*},
};
pub use collect::Collect;

/// In-memory storage backend.
///
/// Every collection is a `Collect` over a HashMap; intended for tests and
/// local development.
#[derive(Debug, Clone)]
pub struct MemStore {
    workflows: Arc<Collect<Workflow>>,
    runs: Arc<Collect<Run>>,
    logs: Arc<Collect<Log>>,
    notifications: Arc<Collect<Notification>>,
    events: Arc<Collect<Event>>,
}

/// Document view of a record: its id plus a column → JSON value map the
/// query filters evaluate against.
trait DbDocument: Serialize + DeserializeOwned {
    fn id(&self) -> &str;
    fn doc(&self) -> Result<HashMap<String, JsonValue>>;
}

impl DbStore for MemStore {
    fn init(
        &self,
        s: &Store,
    ) {
        s.register(self.workflows());
        s.register(self.runs());
        s.register(self.logs());
        s.register(self.notifications());
        s.register(self.events());
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        let workflows = Collect::new("workflows");
        let runs = Collect::new("runs");
        let logs = Collect::new("logs");
        let notifications = Collect::new("notifications");
        let events = Collect::new("events");

        Self {
            workflows: Arc::new(workflows),
            runs: Arc::new(runs),
            logs: Arc::new(logs),
            notifications: Arc::new(notifications),
            events: Arc::new(events),
        }
    }

    pub fn workflows(&self) -> Arc<dyn DbCollection<Item = Workflow> + Send + Sync> {
        self.workflows.clone()
    }

    pub fn runs(&self) -> Arc<dyn DbCollection<Item = Run> + Send + Sync> {
        self.runs.clone()
    }

    pub fn logs(&self) -> Arc<dyn DbCollection<Item = Log> + Send + Sync> {
        self.logs.clone()
    }

    pub fn notifications(&self) -> Arc<dyn DbCollection<Item = Notification> + Send + Sync> {
        self.notifications.clone()
    }

    pub fn events(&self) -> Arc<dyn DbCollection<Item = Event> + Send + Sync> {
        self.events.clone()
    }
}
