use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::store::{DbCollection, DbStore, Store, data::*};

use super::{DbInit, collection::*, synclient::SynClient};

/// PostgreSQL storage backend.
pub struct PostgresStore {
    workflows: Arc<WorkflowCollection>,
    runs: Arc<RunCollection>,
    logs: Arc<LogCollection>,
    notifications: Arc<NotificationCollection>,
    events: Arc<EventCollection>,
}

impl DbStore for PostgresStore {
    fn init(
        &self,
        s: &Store,
    ) {
        self.workflows.init();
        self.runs.init();
        self.logs.init();
        self.notifications.init();
        self.events.init();

        s.register(self.workflows());
        s.register(self.runs());
        s.register(self.logs());
        s.register(self.notifications());
        s.register(self.events());
    }
}

impl PostgresStore {
    pub fn new(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Self {
        let conn = Arc::new(SynClient::connect(db_url, runtime.clone()));
        let workflows = WorkflowCollection::new(&conn);
        let runs = RunCollection::new(&conn);
        let logs = LogCollection::new(&conn, runtime.clone());
        let notifications = NotificationCollection::new(&conn);
        let events = EventCollection::new(&conn, runtime.clone());

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
