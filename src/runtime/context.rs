use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    common::{MemCache, Shutdown, Vars},
    events::{Event, Log},
    runtime::{Channel, RunId},
    utils,
    workflow::node::NodeId,
};

/// Per-run execution context.
///
/// Holds the accumulated node outputs, emits the run's log trace, and
/// carries the run's termination signal.
#[derive(Clone)]
pub struct Context {
    pid: RunId,
    outputs: Arc<MemCache<NodeId, Vars>>,
    channel: Arc<Channel>,
    log_seq: Arc<AtomicU64>,

    shutdown: Arc<Shutdown>,
}

impl Context {
    pub fn new(
        pid: RunId,
        channel: Arc<Channel>,
    ) -> Self {
        Self {
            pid,
            outputs: Arc::new(MemCache::new(1024)),
            channel,
            log_seq: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub fn outputs(&self) -> Arc<MemCache<NodeId, Vars>> {
        self.outputs.clone()
    }

    pub fn add_output(
        &self,
        nid: NodeId,
        outputs: Vars,
    ) {
        self.outputs.set(nid, outputs);
    }

    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Append one line to the run's log trace. The sequence number keeps
    /// the persisted trace in execution order even when timestamps tie.
    pub fn emit_log(
        &self,
        nid: NodeId,
        content: String,
    ) {
        let log = Log {
            pid: self.pid.clone(),
            nid,
            seq: self.log_seq.fetch_add(1, Ordering::SeqCst),
            content,
            timestamp: utils::time::time_millis(),
        };
        let _ = self.channel.log_queue().send(Event::new(&log));
    }

    pub fn pid(&self) -> RunId {
        self.pid.to_owned()
    }

    pub fn done(&self) {
        self.shutdown.shutdown();
    }

    pub fn is_done(&self) -> bool {
        self.shutdown.is_terminated()
    }
}
