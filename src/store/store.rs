use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, RwLock},
};

use serde_json::json;
use tracing::trace;

use crate::{
    FlowletError, Result, ShareLock,
    model::{WorkflowModel, WorkflowStatus},
    utils,
};

use super::{
    DbCollection, DbCollectionIden, StoreIden,
    data::*,
    query::{Filter, Query},
};

#[derive(Clone)]
pub struct DynDbSetRef<T>(Arc<dyn DbCollection<Item = T>>);

/// Registry of the typed collections provided by the active backend.
pub struct Store {
    collections: ShareLock<HashMap<StoreIden, Arc<dyn Any + Send + Sync + 'static>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn collection<DATA>(&self) -> Arc<dyn DbCollection<Item = DATA>>
    where
        DATA: DbCollectionIden + Send + Sync + 'static,
    {
        let collections = self.collections.read().unwrap();

        #[allow(clippy::expect_fun_call)]
        let collection = collections.get(&DATA::iden()).expect(&format!("fail to get collection: {}", DATA::iden().as_ref()));

        #[allow(clippy::expect_fun_call)]
        collection.downcast_ref::<DynDbSetRef<DATA>>().map(|v| v.0.clone()).expect(&format!("fail to get collection: {}", DATA::iden().as_ref()))
    }

    pub fn register<DATA>(
        &self,
        collection: Arc<dyn DbCollection<Item = DATA> + Send + Sync + 'static>,
    ) where
        DATA: DbCollectionIden + 'static,
    {
        let mut collections = self.collections.write().unwrap();
        collections.insert(DATA::iden(), Arc::new(DynDbSetRef::<DATA>(collection)));
    }

    pub fn workflows(&self) -> Arc<dyn DbCollection<Item = Workflow>> {
        self.collection()
    }

    pub fn runs(&self) -> Arc<dyn DbCollection<Item = Run>> {
        self.collection()
    }

    pub fn logs(&self) -> Arc<dyn DbCollection<Item = Log>> {
        self.collection()
    }

    pub fn notifications(&self) -> Arc<dyn DbCollection<Item = Notification>> {
        self.collection()
    }

    pub fn events(&self) -> Arc<dyn DbCollection<Item = Event>> {
        self.collection()
    }

    /// Upsert a workflow document.
    ///
    /// On update the stored status and create time are preserved; status
    /// transitions go through `set_workflow_status`.
    pub fn deploy(
        &self,
        workflow: &WorkflowModel,
    ) -> Result<bool> {
        trace!("store::deploy({})", workflow.id);
        if workflow.id.is_empty() {
            return Err(FlowletError::Workflow("missing id in workflow".into()));
        }
        let config = workflow.graph.to_json()?;
        let workflows = self.workflows();
        match workflows.find(&workflow.id) {
            Ok(m) => {
                let data = Workflow {
                    id: workflow.id.clone(),
                    oid: workflow.oid.clone(),
                    name: workflow.name.clone(),
                    desc: workflow.desc.clone(),
                    prompt: workflow.prompt.clone(),
                    category: workflow.category.clone(),
                    status: m.status,
                    config,
                    create_time: m.create_time,
                    update_time: utils::time::time_millis(),
                };
                workflows.update(&data)
            }
            Err(_) => {
                let data = Workflow {
                    id: workflow.id.clone(),
                    oid: workflow.oid.clone(),
                    name: workflow.name.clone(),
                    desc: workflow.desc.clone(),
                    prompt: workflow.prompt.clone(),
                    category: workflow.category.clone(),
                    status: workflow.status.as_ref().to_string(),
                    config,
                    create_time: utils::time::time_millis(),
                    update_time: 0,
                };
                workflows.create(&data)
            }
        }
    }

    /// Explicit workflow lifecycle transition.
    pub fn set_workflow_status(
        &self,
        wid: &str,
        status: WorkflowStatus,
    ) -> Result<bool> {
        trace!("store::set_workflow_status({}, {})", wid, status.as_ref());
        let workflows = self.workflows();
        let mut data = workflows.find(wid)?;
        data.status = status.as_ref().to_string();
        data.update_time = utils::time::time_millis();
        workflows.update(&data)
    }

    /// Dashboard badge count: notifications created within the last 24
    /// hours or still unread.
    pub fn unread_notifications(
        &self,
        oid: &str,
    ) -> Result<usize> {
        let cutoff = utils::time::time_millis() - utils::time::DAY_MILLIS;
        let page = self.notifications().query(&Query::new().filter(Filter::Eq("oid".to_string(), json!(oid))))?;
        Ok(page.rows.iter().filter(|n| n.read_time.is_none() || n.timestamp > cutoff).count())
    }

    /// Mark one notification as read.
    pub fn mark_notification_read(
        &self,
        id: &str,
    ) -> Result<bool> {
        let notifications = self.notifications();
        let mut data = notifications.find(id)?;
        if data.read_time.is_none() {
            data.read_time = Some(utils::time::time_millis());
        }
        notifications.update(&data)
    }
}
