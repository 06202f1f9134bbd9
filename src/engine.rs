//! Workflow run engine - the main entry point for Flowlet.
//!
//! The engine manages workflow documents and their runs:
//! - Deploying workflow documents and switching their lifecycle status
//! - Starting runs (precondition checks, run record creation, graph
//!   compilation, hand-off to the walker)
//! - Managing the event channel, storage and the monitor
//! - Graceful shutdown coordination

mod alerts;
mod monitor;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::runtime::{Builder, Runtime};

use crate::{
    Config, FlowletError, Result, StoreType,
    common::{MemCache, Queue, Shutdown},
    model::{GraphModel, WorkflowModel, WorkflowStatus},
    runtime::{Channel, ChannelEvent, ChannelOptions, Run, RunId},
    store::{DbStore, MemStore, PostgresStore, Store, data},
    utils,
    workflow::Graph,
};

use crate::events::{Event, GraphEvent, Message, WorkflowEvent, WorkflowFailedEvent};

use monitor::Monitor;

/// Maximum number of live runs to cache in memory.
const RUN_CACHE_SIZE: usize = 2048;
/// Size of the queue for completed run notifications.
const RUN_COMPLETE_QUEUE_SIZE: usize = 100;
/// Category recorded on runs of workflows that declare none.
const DEFAULT_RUN_CATEGORY: &str = "automation";

/// The main workflow run engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
/// engine.launch();
///
/// engine.deploy(&workflow_model)?;
/// engine.activate(&workflow_model.id)?;
///
/// let run = engine.start_run(&workflow_model.id, "user_1")?;
///
/// engine.shutdown();
/// ```
pub struct Engine {
    /// Event channel for broadcasting run events.
    channel: Arc<Channel>,
    /// Persistent storage for workflows, runs, logs and notifications.
    store: Arc<Store>,
    /// Background monitor for event persistence and run finalization.
    monitor: Monitor,
    /// Queue for receiving run completion notifications.
    runs_complete_queue: Arc<Queue<RunId>>,
    /// In-memory cache of live runs.
    runs: Arc<MemCache<RunId, Arc<Run>>>,
    /// Wall-clock budget applied to every run.
    run_deadline: Option<Duration>,

    /// Flag indicating if the engine is running.
    running: Arc<AtomicBool>,
    /// Tokio runtime for async task execution.
    runtime: Arc<Runtime>,
    /// Shutdown coordinator for graceful termination.
    shutdown: Arc<Shutdown>,
}

impl Engine {
    /// Creates a new engine with the given configuration, building its own
    /// tokio runtime.
    pub fn new_with_config(config: Config) -> Self {
        let runtime = Arc::new(Builder::new_multi_thread().worker_threads(config.async_worker_thread_number.into()).enable_all().build().unwrap());
        Self::new_with_runtime(config, runtime)
    }

    /// Creates a new engine on a caller-provided runtime.
    pub fn new_with_runtime(
        config: Config,
        runtime: Arc<Runtime>,
    ) -> Self {
        let store = Store::new();
        let db: Box<dyn DbStore> = match config.store.store_type {
            StoreType::Mem => {
                let mem = MemStore::new();
                Box::new(mem)
            }
            StoreType::Postgres => {
                let postgres = PostgresStore::new(
                    &config.store.postgres.expect("Postgres configuration is required when store type is Postgres").database_url,
                    runtime.clone(),
                );
                Box::new(postgres)
            }
        };
        db.init(&store);

        let store = Arc::new(store);
        let channel = Arc::new(Channel::new(runtime.clone()));
        let monitor = Monitor::new(store.clone(), channel.clone(), runtime.clone());

        let runs_complete_queue = Queue::new(RUN_COMPLETE_QUEUE_SIZE);

        Self {
            channel,
            store,
            monitor,
            runs_complete_queue,
            runs: Arc::new(MemCache::new(RUN_CACHE_SIZE)),
            run_deadline: config.run.deadline_ms.map(Duration::from_millis),
            running: Arc::new(AtomicBool::new(false)),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Starts the engine and begins processing events.
    pub fn launch(&self) {
        if self.running.swap(true, Ordering::Relaxed) {
            return;
        }

        // Register handlers first, then start listening
        // This ensures no events are missed
        self.monitor.monitor();
        self.channel.listen();

        // Evict terminal runs from the live-run cache
        let runs_complete_queue = self.runs_complete_queue.clone();
        ChannelEvent::channel(self.channel.clone(), ChannelOptions::default()).on_event(move |e| {
            if e.event.is_terminal() {
                let _ = runs_complete_queue.send(e.pid.clone());
            }
        });

        let runs_complete_queue = self.runs_complete_queue.clone();
        let shutdown = self.shutdown.clone();
        let runs = self.runs.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    Some(rid) = runs_complete_queue.next_async() => {
                        runs.remove(&rid);
                    }
                }
            }
        });
    }

    /// Gracefully shuts down the engine, aborting all live runs.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        self.shutdown.shutdown();
        for (_, run) in self.runs.iter() {
            run.abort();
        }
        self.channel.shutdown();
    }

    /// Deploys a workflow document to the store.
    pub fn deploy(
        &self,
        workflow: &WorkflowModel,
    ) -> Result<bool> {
        self.store.deploy(workflow)
    }

    /// Marks a workflow `active`, allowing runs.
    pub fn activate(
        &self,
        wid: &str,
    ) -> Result<bool> {
        self.store.set_workflow_status(wid, WorkflowStatus::Active)
    }

    /// Marks a workflow `paused`; new runs are rejected.
    pub fn pause(
        &self,
        wid: &str,
    ) -> Result<bool> {
        self.store.set_workflow_status(wid, WorkflowStatus::Paused)
    }

    /// Starts a run of a workflow on behalf of a user.
    ///
    /// The run record is created only after the workflow passed the
    /// active-status precondition; configuration problems found after
    /// that point finalize the record as failed and surface as errors.
    /// The returned handle is live immediately; the walk proceeds on the
    /// engine runtime.
    pub fn start_run(
        &self,
        wid: &str,
        uid: &str,
    ) -> Result<Arc<Run>> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(FlowletError::Engine("Engine is not running".to_string()));
        }

        let workflow = self
            .store
            .workflows()
            .find(wid)
            .map_err(|_| FlowletError::Precondition(format!("workflow {} not found", wid)))?;
        if workflow.status != WorkflowStatus::Active.as_ref() {
            return Err(FlowletError::Precondition("workflow is not active".to_string()));
        }

        let rid = utils::longid();
        let now = utils::time::time_millis();
        self.store.runs().create(&data::Run {
            id: rid.clone(),
            wid: wid.to_string(),
            oid: workflow.oid.clone(),
            uid: uid.to_string(),
            state: data::RunState::Running.as_ref().to_string(),
            category: if workflow.category.is_empty() {
                DEFAULT_RUN_CATEGORY.to_string()
            } else {
                workflow.category.clone()
            },
            duration: 0,
            cost: None,
            err: None,
            start_time: now,
            end_time: 0,
            timestamp: now,
        })?;

        let graph = GraphModel::from_json(&workflow.config)
            .and_then(|model| Graph::try_from(&model))
            .and_then(|graph| {
                if graph.trigger_node().is_none() {
                    Err(FlowletError::MalformedConfig("no trigger node in workflow graph".to_string()))
                } else {
                    Ok(graph)
                }
            });
        let graph = match graph {
            Ok(graph) => Arc::new(graph),
            Err(e) => {
                self.fail_run(&rid, &e);
                return Err(e);
            }
        };

        let run = Run::new(rid.clone(), wid.to_string(), graph, self.channel.clone(), self.runtime.clone(), self.run_deadline);

        self.runs.set(rid, run.clone());
        run.start();

        Ok(run)
    }

    /// Gets a live run by its ID from the cache.
    pub fn get_run(
        &self,
        rid: &RunId,
    ) -> Option<Arc<Run>> {
        self.runs.get(rid)
    }

    /// Returns a reference to the event channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Returns the store, for run history, logs and notifications.
    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    /// Finalize a run that never reached the walker: publish the failed
    /// event so the monitor records it through the same path as walk
    /// failures.
    fn fail_run(
        &self,
        rid: &str,
        err: &FlowletError,
    ) {
        let _ = self.channel.event_queue().send(Event::new(&Message {
            pid: rid.to_string(),
            nid: "".to_string(),
            event: GraphEvent::Workflow(WorkflowEvent::Failed(WorkflowFailedEvent {
                error: err.to_string(),
            })),
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use serde_json::json;

    use crate::{
        EngineBuilder, FlowletError,
        model::{GraphModel, WorkflowModel, WorkflowStatus},
        store::{
            data,
            data::RunState,
            query::{Filter, Query},
        },
        utils,
    };

    use super::Engine;

    fn engine() -> Engine {
        let engine = EngineBuilder::new().async_worker_thread_number(4).build().unwrap();
        engine.launch();
        engine
    }

    fn workflow(
        id: &str,
        graph: &str,
    ) -> WorkflowModel {
        WorkflowModel {
            id: id.to_string(),
            oid: "org_1".to_string(),
            name: format!("{} workflow", id),
            desc: String::new(),
            prompt: String::new(),
            category: String::new(),
            status: WorkflowStatus::Draft,
            graph: GraphModel::from_json(graph).unwrap(),
        }
    }

    fn deploy_active(
        engine: &Engine,
        id: &str,
        graph: &str,
    ) {
        engine.deploy(&workflow(id, graph)).unwrap();
        engine.activate(id).unwrap();
    }

    /// Poll the run record until it leaves the running state.
    fn wait_terminal(
        engine: &Engine,
        rid: &str,
    ) -> data::Run {
        for _ in 0..400 {
            let run = engine.store().runs().find(rid).unwrap();
            if run.state != RunState::Running.as_ref() {
                return run;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("run {} did not terminate", rid);
    }

    /// The monitor persists logs asynchronously; poll until the trace is
    /// non-empty and stable.
    fn logs_of(
        engine: &Engine,
        rid: &str,
    ) -> Vec<String> {
        let fetch = || {
            engine
                .store()
                .logs()
                .query(&Query::new().filter(Filter::Eq("pid".to_string(), json!(rid))).order("seq", false))
                .unwrap()
                .rows
                .into_iter()
                .map(|l| l.content)
                .collect::<Vec<_>>()
        };

        let mut last = fetch();
        for _ in 0..200 {
            thread::sleep(Duration::from_millis(25));
            let next = fetch();
            if !next.is_empty() && next.len() == last.len() {
                return next;
            }
            last = next;
        }
        last
    }

    const LINEAR: &str = r#"{
        "nodes": [
            { "id": "t", "type": "trigger", "data": { "label": "Form Submitted" } },
            { "id": "a", "type": "action", "data": { "label": "Send Email", "parameters": { "to": "ops@example.com" } } },
            { "id": "b", "type": "action", "data": { "label": "Add Row" } }
        ],
        "edges": [
            { "source": "t", "target": "a" },
            { "source": "a", "target": "b" }
        ]
    }"#;

    #[test]
    fn linear_chain_succeeds_with_ordered_log_pairs() {
        let engine = engine();
        deploy_active(&engine, "w_linear", LINEAR);

        let run = engine.start_run("w_linear", "user_1").unwrap();
        let record = wait_terminal(&engine, run.id());

        assert_eq!(record.state, RunState::Success.as_ref());
        assert!(record.duration >= 0);
        assert_eq!(record.category, "automation");
        assert_eq!(record.oid, "org_1");
        assert_eq!(record.uid, "user_1");
        assert!(record.err.is_none());

        let logs = logs_of(&engine, run.id());
        assert_eq!(
            logs,
            vec![
                "Executing Form Submitted",
                "✅ Form Submitted completed",
                "Executing Send Email",
                "✅ Send Email completed",
                "Executing Add Row",
                "✅ Add Row completed",
            ]
        );
    }

    #[test]
    fn inactive_workflow_is_rejected_without_a_run_record() {
        let engine = engine();
        engine.deploy(&workflow("w_draft", LINEAR)).unwrap();

        let err = engine.start_run("w_draft", "user_1").unwrap_err();
        assert!(matches!(err, FlowletError::Precondition(_)));
        assert_eq!(err.to_string(), "precondition failed: workflow is not active");

        engine.activate("w_draft").unwrap();
        engine.pause("w_draft").unwrap();
        let err = engine.start_run("w_draft", "user_1").unwrap_err();
        assert!(matches!(err, FlowletError::Precondition(_)));

        let runs = engine.store().runs().query(&Query::new().filter(Filter::Eq("wid".to_string(), json!("w_draft")))).unwrap();
        assert_eq!(runs.count, 0);
    }

    #[test]
    fn missing_workflow_is_a_precondition_failure() {
        let engine = engine();
        let err = engine.start_run("w_ghost", "user_1").unwrap_err();
        assert!(matches!(err, FlowletError::Precondition(_)));
    }

    #[test]
    fn missing_trigger_fails_and_still_records_the_run() {
        let engine = engine();
        deploy_active(
            &engine,
            "w_no_trigger",
            r#"{ "nodes": [ { "id": "a", "type": "action", "data": { "label": "Orphan" } } ], "edges": [] }"#,
        );

        let err = engine.start_run("w_no_trigger", "user_1").unwrap_err();
        assert!(matches!(err, FlowletError::MalformedConfig(_)));

        let runs = engine.store().runs().query(&Query::new().filter(Filter::Eq("wid".to_string(), json!("w_no_trigger")))).unwrap();
        assert_eq!(runs.count, 1);
        let record = wait_terminal(&engine, &runs.rows[0].id);
        assert_eq!(record.state, RunState::Failed.as_ref());
        assert!(record.err.unwrap().contains("no trigger node"));
    }

    #[test]
    fn unparsable_config_fails_and_still_records_the_run() {
        let engine = engine();
        // write a corrupted document directly, bypassing the typed deploy
        let now = utils::time::time_millis();
        engine
            .store()
            .workflows()
            .create(&data::Workflow {
                id: "w_corrupt".to_string(),
                oid: "org_1".to_string(),
                name: "corrupt".to_string(),
                desc: String::new(),
                prompt: String::new(),
                category: String::new(),
                status: WorkflowStatus::Active.as_ref().to_string(),
                config: "{ not json".to_string(),
                create_time: now,
                update_time: 0,
            })
            .unwrap();

        let err = engine.start_run("w_corrupt", "user_1").unwrap_err();
        assert!(matches!(err, FlowletError::MalformedConfig(_)));

        let runs = engine.store().runs().query(&Query::new().filter(Filter::Eq("wid".to_string(), json!("w_corrupt")))).unwrap();
        assert_eq!(runs.count, 1);
        let record = wait_terminal(&engine, &runs.rows[0].id);
        assert_eq!(record.state, RunState::Failed.as_ref());
    }

    #[test]
    fn fan_out_executes_each_branch_once() {
        let engine = engine();
        deploy_active(
            &engine,
            "w_fan_out",
            r#"{
                "nodes": [
                    { "id": "t", "type": "trigger", "data": { "label": "T" } },
                    { "id": "b", "type": "action", "data": { "label": "B" } },
                    { "id": "c", "type": "action", "data": { "label": "C" } }
                ],
                "edges": [
                    { "source": "t", "target": "b" },
                    { "source": "t", "target": "c" }
                ]
            }"#,
        );

        let run = engine.start_run("w_fan_out", "user_1").unwrap();
        let record = wait_terminal(&engine, run.id());
        assert_eq!(record.state, RunState::Success.as_ref());

        let logs = logs_of(&engine, run.id());
        assert_eq!(logs.iter().filter(|l| *l == "Executing B").count(), 1);
        assert_eq!(logs.iter().filter(|l| *l == "Executing C").count(), 1);
        // branches run in edge order
        assert_eq!(
            logs,
            vec!["Executing T", "✅ T completed", "Executing B", "✅ B completed", "Executing C", "✅ C completed"]
        );
    }

    #[test]
    fn fan_in_executes_once_and_first_path_wins() {
        let engine = engine();
        deploy_active(
            &engine,
            "w_fan_in",
            r#"{
                "nodes": [
                    { "id": "t", "type": "trigger", "data": { "label": "T" } },
                    { "id": "b", "type": "action", "data": { "label": "B", "parameters": { "mark": "from_b" } } },
                    { "id": "c", "type": "action", "data": { "label": "C", "parameters": { "mark": "from_c" } } },
                    { "id": "d", "type": "action", "data": { "label": "D" } }
                ],
                "edges": [
                    { "source": "t", "target": "b" },
                    { "source": "t", "target": "c" },
                    { "source": "b", "target": "d" },
                    { "source": "c", "target": "d" }
                ]
            }"#,
        );

        let run = engine.start_run("w_fan_in", "user_1").unwrap();
        let record = wait_terminal(&engine, run.id());
        assert_eq!(record.state, RunState::Success.as_ref());

        let logs = logs_of(&engine, run.id());
        assert_eq!(logs.iter().filter(|l| *l == "Executing D").count(), 1);

        // D ran on B's branch (first edge from t), so its accumulated
        // input carries B's payload and not C's
        let outputs = run.outputs();
        let d: serde_json::Value = outputs.get("d").unwrap();
        assert!(d.get("b").is_some());
        assert!(d.get("c").is_none());
        assert_eq!(d["b"]["parameters"]["mark"], json!("from_b"));
    }

    #[test]
    fn cyclic_graph_terminates_with_each_node_run_once() {
        let engine = engine();
        deploy_active(
            &engine,
            "w_cycle",
            r#"{
                "nodes": [
                    { "id": "t", "type": "trigger", "data": { "label": "T" } },
                    { "id": "a", "type": "action", "data": { "label": "A" } },
                    { "id": "b", "type": "action", "data": { "label": "B" } }
                ],
                "edges": [
                    { "source": "t", "target": "a" },
                    { "source": "a", "target": "b" },
                    { "source": "b", "target": "a" }
                ]
            }"#,
        );

        let run = engine.start_run("w_cycle", "user_1").unwrap();
        let record = wait_terminal(&engine, run.id());
        assert_eq!(record.state, RunState::Success.as_ref());

        let logs = logs_of(&engine, run.id());
        assert_eq!(logs.iter().filter(|l| *l == "Executing A").count(), 1);
        assert_eq!(logs.iter().filter(|l| *l == "Executing B").count(), 1);
    }

    #[test]
    fn failing_node_aborts_later_siblings_and_descendants() {
        let engine = engine();
        deploy_active(
            &engine,
            "w_failing",
            r#"{
                "nodes": [
                    { "id": "t", "type": "trigger", "data": { "label": "T" } },
                    { "id": "ok", "type": "action", "data": { "label": "Ok" } },
                    { "id": "x", "type": "webhook", "data": { "label": "X" } },
                    { "id": "late", "type": "action", "data": { "label": "Late" } },
                    { "id": "child", "type": "action", "data": { "label": "Child" } }
                ],
                "edges": [
                    { "source": "t", "target": "ok" },
                    { "source": "t", "target": "x" },
                    { "source": "t", "target": "late" },
                    { "source": "x", "target": "child" }
                ]
            }"#,
        );

        let run = engine.start_run("w_failing", "user_1").unwrap();
        let record = wait_terminal(&engine, run.id());

        assert_eq!(record.state, RunState::Failed.as_ref());
        assert!(record.err.unwrap().contains("unknown node type: webhook"));

        let logs = logs_of(&engine, run.id());
        // the sibling ordered before the failure has executed
        assert!(logs.contains(&"✅ Ok completed".to_string()));
        assert!(logs.contains(&"❌ X failed: unknown node type: webhook".to_string()));
        // the sibling ordered after the failure and the failing node's
        // descendant never ran
        assert!(!logs.iter().any(|l| l.contains("Late")));
        assert!(!logs.iter().any(|l| l.contains("Child")));
    }

    #[test]
    fn expired_deadline_fails_the_run_with_timeout() {
        let engine = EngineBuilder::new().async_worker_thread_number(4).run_deadline_ms(0).build().unwrap();
        engine.launch();
        deploy_active(&engine, "w_deadline", LINEAR);

        let run = engine.start_run("w_deadline", "user_1").unwrap();
        let record = wait_terminal(&engine, run.id());

        assert_eq!(record.state, RunState::Failed.as_ref());
        assert!(record.err.unwrap().starts_with("timeout:"));
    }

    #[test]
    fn repeated_failures_raise_burst_notifications() {
        let engine = engine();
        deploy_active(
            &engine,
            "w_burst",
            r#"{
                "nodes": [
                    { "id": "t", "type": "trigger", "data": { "label": "T" } },
                    { "id": "x", "type": "webhook", "data": { "label": "X" } }
                ],
                "edges": [ { "source": "t", "target": "x" } ]
            }"#,
        );

        let burst_alerts = |engine: &Engine| {
            engine
                .store()
                .notifications()
                .query(&Query::new().filter(Filter::Eq("kind".to_string(), json!("workflow_failed"))))
                .unwrap()
                .count
        };

        for _ in 0..2 {
            let run = engine.start_run("w_burst", "user_1").unwrap();
            wait_terminal(&engine, run.id());
        }
        thread::sleep(Duration::from_millis(50));
        assert_eq!(burst_alerts(&engine), 0);

        let run = engine.start_run("w_burst", "user_1").unwrap();
        wait_terminal(&engine, run.id());
        for _ in 0..400 {
            if burst_alerts(&engine) == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(burst_alerts(&engine), 1);

        // the fourth failure emits a second notification
        let run = engine.start_run("w_burst", "user_1").unwrap();
        wait_terminal(&engine, run.id());
        for _ in 0..400 {
            if burst_alerts(&engine) == 2 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(burst_alerts(&engine), 2);
    }

    #[test]
    fn run_category_is_copied_from_the_workflow() {
        let engine = engine();
        let mut model = workflow("w_category", LINEAR);
        model.category = "marketing".to_string();
        engine.deploy(&model).unwrap();
        engine.activate("w_category").unwrap();

        let run = engine.start_run("w_category", "user_1").unwrap();
        let record = wait_terminal(&engine, run.id());
        assert_eq!(record.category, "marketing");
    }
}
