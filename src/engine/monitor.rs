use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::warn;

use crate::{
    engine::alerts,
    events::{GraphEvent, WorkflowEvent},
    runtime::Channel,
    store::{
        Store, data,
        data::RunState,
    },
    utils,
};

/// Projects the event stream into the persisted records.
///
/// The monitor is the single writer of run finalization: it performs the
/// one terminal state transition (computing the duration), persists raw
/// events and log lines, and feeds the alert rules — so "run finished" is
/// one event with one consumer chain rather than two competing recorders.
pub struct Monitor {
    store: Arc<Store>,
    channel: Arc<Channel>,

    runtime: Arc<Runtime>,
}

impl Monitor {
    pub fn new(
        store: Arc<Store>,
        channel: Arc<Channel>,
        runtime: Arc<Runtime>,
    ) -> Self {
        Self {
            store,
            channel,
            runtime,
        }
    }

    pub fn monitor(&self) {
        let store = self.store.clone();
        let channel = self.channel.clone();

        self.runtime.spawn(async move {
            let mut event_queue = channel.event_queue().subscribe();
            while let Ok(event_msg) = event_queue.recv().await {
                let event = &event_msg;

                // 1. Persist the raw event for audit
                let _ = store.events().create(&data::Event {
                    id: utils::longid(),
                    pid: event.pid.clone(),
                    nid: event.nid.clone(),
                    name: match &event.event {
                        GraphEvent::Workflow(e) => e.str().to_string(),
                        GraphEvent::Node(n) => n.str().to_string(),
                    },
                    message: format!("{:?}", event.event),
                    timestamp: utils::time::time_millis(),
                });

                // 2. Finalize the run record on its terminal event
                if let GraphEvent::Workflow(e) = &event.event {
                    match e {
                        WorkflowEvent::Succeeded | WorkflowEvent::Failed(_) | WorkflowEvent::Aborted(_) => {
                            Self::finalize(&store, &event.pid, e);
                        }
                        _ => {}
                    }
                }
            }
        });

        let store = self.store.clone();
        let channel = self.channel.clone();

        self.runtime.spawn(async move {
            let mut log_queue = channel.log_queue().subscribe();
            while let Ok(log_msg) = log_queue.recv().await {
                let log = &log_msg;
                let _ = store.logs().create(&data::Log {
                    id: utils::longid(),
                    pid: log.pid.clone(),
                    nid: log.nid.clone(),
                    seq: log.seq as i64,
                    content: log.content.clone(),
                    timestamp: log.timestamp,
                });
            }
        });
    }

    /// One terminal transition per run: a second terminal event for the
    /// same run is ignored, so the recorded duration cannot be silently
    /// overwritten.
    fn finalize(
        store: &Arc<Store>,
        pid: &str,
        event: &WorkflowEvent,
    ) {
        let mut run = match store.runs().find(pid) {
            Ok(run) => run,
            Err(e) => {
                warn!("run {} missing on terminal event: {}", pid, e);
                return;
            }
        };
        if run.state != RunState::Running.as_ref() {
            return;
        }

        let now = utils::time::time_millis();
        run.state = match event {
            WorkflowEvent::Succeeded => RunState::Success.as_ref().to_string(),
            _ => RunState::Failed.as_ref().to_string(),
        };
        run.err = match event {
            WorkflowEvent::Failed(f) => Some(f.error.clone()),
            WorkflowEvent::Aborted(a) => Some(a.reason.clone()),
            _ => None,
        };
        run.end_time = now;
        run.duration = (now - run.start_time) / 1000;
        run.timestamp = now;

        if let Err(e) = store.runs().update(&run) {
            warn!("failed to finalize run {}: {}", run.id, e);
            return;
        }

        if let Err(e) = alerts::evaluate(store, &run) {
            warn!("alert evaluation failed for run {}: {}", run.id, e);
        }
    }
}
