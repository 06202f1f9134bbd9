//! Event channel for run observation.
//!
//! Execution publishes graph events and log lines onto broadcast queues;
//! subscribers register handlers filtered by run id / node id glob
//! patterns.

use std::sync::{Arc, RwLock};

use tokio::runtime::Runtime;

use crate::{
    ShareLock,
    common::{BroadcastQueue, Shutdown},
    events::{Event, Log, Message},
    runtime::RunId,
};

const EVENT_QUEUE_SIZE: usize = 2048;
const LOG_QUEUE_SIZE: usize = 4096;

pub type WorkflowEventHandle = Arc<dyn Fn(&Event<Message>) + Send + Sync>;
pub type WorkflowLogHandle = Arc<dyn Fn(&Event<Log>) + Send + Sync>;

/// Subscription filter: glob patterns over the run id and node id.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// glob pattern matched against the run id, e.g. `run1*`
    pub pid: String,
    /// glob pattern matched against the node id
    pub nid: String,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            pid: "*".to_string(),
            nid: "*".to_string(),
        }
    }
}

impl ChannelOptions {
    pub fn with_pid(pid: String) -> Self {
        Self {
            pid,
            nid: "*".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Channel {
    event_queue: Arc<BroadcastQueue<Event<Message>>>,
    log_queue: Arc<BroadcastQueue<Event<Log>>>,

    events: ShareLock<Vec<WorkflowEventHandle>>,
    logs: ShareLock<Vec<WorkflowLogHandle>>,

    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl Channel {
    pub(crate) fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            event_queue: BroadcastQueue::new(EVENT_QUEUE_SIZE),
            log_queue: BroadcastQueue::new(LOG_QUEUE_SIZE),
            events: Arc::new(RwLock::new(Vec::new())),
            logs: Arc::new(RwLock::new(Vec::new())),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub(crate) fn event_queue(&self) -> Arc<BroadcastQueue<Event<Message>>> {
        self.event_queue.clone()
    }

    pub(crate) fn log_queue(&self) -> Arc<BroadcastQueue<Event<Log>>> {
        self.log_queue.clone()
    }

    /// Start fanning queued events out to registered handlers.
    pub(crate) fn listen(&self) {
        let mut event_queue = self.event_queue.subscribe();
        let mut log_queue = self.log_queue.subscribe();
        let events = self.events.clone();
        let logs = self.logs.clone();

        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    Ok(e) = event_queue.recv() => {
                        let handlers = events.read().unwrap().clone();
                        for handle in handlers.iter() {
                            (handle)(&e);
                        }
                    }
                    Ok(log) = log_queue.recv() => {
                        let handlers = logs.read().unwrap().clone();
                        for handle in handlers.iter() {
                            (handle)(&log);
                        }
                    }
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }
}

/// Handle for registering filtered event handlers on a [`Channel`].
#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,

    glob: (globset::GlobMatcher, globset::GlobMatcher),
}

impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Self {
        Self {
            channel,
            glob: (
                globset::Glob::new(&options.pid).unwrap().compile_matcher(),
                globset::Glob::new(&options.nid).unwrap().compile_matcher(),
            ),
        }
    }

    /// Fires when a matching run completes successfully.
    pub fn on_complete(
        &self,
        f: impl Fn(RunId) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if e.event.is_complete() && is_match(&glob, e) {
                f(e.pid.clone());
            }
        }));
    }

    /// Fires when a matching run fails.
    pub fn on_error(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if e.event.is_error() && is_match(&glob, e) {
                f(e);
            }
        }));
    }

    /// Fires on every matching event.
    pub fn on_event(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if is_match(&glob, e) {
                f(e);
            }
        }));
    }

    /// Fires on every matching log line.
    pub fn on_log(
        &self,
        f: impl Fn(&Event<Log>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.logs.write().unwrap().push(Arc::new(move |e| {
            if is_match_log(&glob, e) {
                f(e);
            }
        }));
    }
}

fn is_match(
    glob: &(globset::GlobMatcher, globset::GlobMatcher),
    e: &Event<Message>,
) -> bool {
    let (pat_pid, pat_nid) = glob;
    pat_pid.is_match(&e.pid) && pat_nid.is_match(&e.nid)
}

fn is_match_log(
    glob: &(globset::GlobMatcher, globset::GlobMatcher),
    e: &Event<Log>,
) -> bool {
    let (pat_pid, pat_nid) = glob;
    pat_pid.is_match(&e.pid) && pat_nid.is_match(&e.nid)
}
