use std::{sync::Arc, time::Duration};

use tokio::runtime::Runtime;

use crate::{
    common::{Queue, Vars},
    events::{GraphEvent, WorkflowEvent},
    runtime::{Channel, ChannelOptions, Context, channel::ChannelEvent},
    walker::Walker,
    workflow::Graph,
};

const COMMAND_QUEUE_SIZE: usize = 100;

pub type RunId = String;

#[derive(Debug, Clone)]
pub enum RunCommand {
    Start,
    Abort,
}

/// Handle to one live run of a workflow.
///
/// Returned by `Engine::start_run` as soon as the run record exists; the
/// traversal itself proceeds on the engine runtime.
#[derive(Clone)]
pub struct Run {
    id: RunId,
    wid: String,
    walker: Arc<Walker>,
    command_queue: Arc<Queue<RunCommand>>,
    channel: Arc<Channel>,
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("id", &self.id)
            .field("wid", &self.wid)
            .finish_non_exhaustive()
    }
}

impl Run {
    pub(crate) fn new(
        id: RunId,
        wid: String,
        graph: Arc<Graph>,
        channel: Arc<Channel>,
        runtime: Arc<Runtime>,
        deadline: Option<Duration>,
    ) -> Arc<Run> {
        let command_queue = Queue::new(COMMAND_QUEUE_SIZE);

        let ctx = Arc::new(Context::new(id.clone(), channel.clone()));

        let walker = Arc::new(Walker::new(ctx, graph, command_queue.clone(), runtime, deadline));

        Arc::new(Run {
            id,
            wid,
            walker,
            command_queue,
            channel,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn wid(&self) -> &str {
        &self.wid
    }

    pub(crate) fn start(&self) {
        self.walker.start();

        let walker = self.walker.clone();

        // the walker stops itself once the run reaches a terminal event
        ChannelEvent::channel(self.channel.clone(), ChannelOptions::with_pid(self.id.to_owned())).on_event(move |event| {
            if let GraphEvent::Workflow(e) = &event.event {
                match e {
                    WorkflowEvent::Succeeded | WorkflowEvent::Failed(_) | WorkflowEvent::Aborted(_) => {
                        walker.stop();
                    }
                    _ => {}
                }
            }
        });

        let _ = self.command_queue.send(RunCommand::Start);
    }

    pub fn abort(&self) {
        let _ = self.command_queue.send(RunCommand::Abort);
    }

    /// Accumulated outputs per node id, as recorded by the walk so far.
    pub fn outputs(&self) -> Vars {
        self.walker.outputs()
    }

    pub fn is_complete(&self) -> bool {
        self.walker.is_complete()
    }
}
