//! Graph walker: executes one run of a compiled workflow graph.
//!
//! The walk is a single sequential depth-first traversal starting at the
//! trigger node. Data flows forward: every node's output is shallow-merged
//! over the input it received, and the merged map becomes the input of
//! each node behind an outgoing edge. A run-scoped visited set guarantees
//! every node executes at most once per run, which also bounds traversal
//! of cyclic graphs.

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::runtime::Runtime;

use crate::{
    FlowletError, Result,
    common::{Queue, Shutdown, Vars},
    events::{ErrorReason, Event, GraphEvent, Message, NodeEvent, WorkflowAbortedEvent, WorkflowEvent, WorkflowFailedEvent},
    runtime::{Context, RunCommand},
    utils,
    workflow::{Graph, node::NodeId},
};

/// Drives the traversal of one run.
///
/// The walker owns a small command loop (start/abort) and spawns the walk
/// itself as one task on the engine runtime; there is no intra-run
/// parallelism, so log order equals execution order.
pub struct Walker {
    /// Execution context with outputs and log emission.
    ctx: Arc<Context>,
    /// The compiled graph to execute.
    graph: Arc<Graph>,
    /// Queue for receiving run commands.
    command_queue: Arc<Queue<RunCommand>>,
    /// Tokio runtime for spawning the walk.
    runtime: Arc<Runtime>,
    /// Shutdown coordinator.
    shutdown: Arc<Shutdown>,
    /// Optional wall-clock budget for the whole run.
    deadline: Option<Duration>,
}

impl Walker {
    pub fn new(
        ctx: Arc<Context>,
        graph: Arc<Graph>,
        command_queue: Arc<Queue<RunCommand>>,
        runtime: Arc<Runtime>,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            ctx,
            graph,
            command_queue,
            runtime,
            shutdown: Arc::new(Shutdown::new()),
            deadline,
        }
    }

    /// Starts the walker's command loop.
    pub fn start(&self) {
        let ctx = self.ctx.clone();
        let graph = self.graph.clone();
        let command_queue = self.command_queue.clone();
        let runtime = self.runtime.clone();
        let shutdown = self.shutdown.clone();
        let deadline = self.deadline;

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,

                    cmd_opt = command_queue.next_async() => {
                        if let Some(cmd) = cmd_opt {
                            match cmd {
                                RunCommand::Start => {
                                    let ctx = ctx.clone();
                                    let graph = graph.clone();
                                    runtime.spawn(async move {
                                        Self::execute(ctx, graph, deadline).await;
                                    });
                                }
                                RunCommand::Abort => {
                                    let _ = ctx.channel().event_queue().send(Event::new(&Message {
                                        pid: ctx.pid(),
                                        nid: "".to_string(),
                                        event: GraphEvent::Workflow(WorkflowEvent::Aborted(WorkflowAbortedEvent {
                                            reason: "aborted by command".to_string(),
                                        })),
                                    }));
                                    // stop the in-flight walk
                                    ctx.done();
                                }
                            }
                        }
                    }
                }
            }
        });
    }

    /// Stops the walker.
    pub fn stop(&self) {
        self.shutdown.shutdown();
    }

    /// Returns all node outputs collected during the walk.
    pub fn outputs(&self) -> Vars {
        let mut result = Vars::new();
        for (nid, vars) in self.ctx.outputs().iter() {
            result.set(nid.as_str(), vars.clone());
        }
        result
    }

    /// Checks if the walker has terminated.
    pub fn is_complete(&self) -> bool {
        self.shutdown.is_terminated()
    }

    /// Runs the full traversal and emits the terminal workflow event.
    async fn execute(
        ctx: Arc<Context>,
        graph: Arc<Graph>,
        deadline: Option<Duration>,
    ) {
        let event_queue = ctx.channel().event_queue();

        tracing::debug!("run {} graph:\n{}", ctx.pid(), graph.schema());

        let _ = event_queue.send(Event::new(&Message {
            pid: ctx.pid(),
            nid: "".to_string(),
            event: GraphEvent::Workflow(WorkflowEvent::Start),
        }));

        // the engine validates trigger presence before handing off
        let Some(trigger) = graph.trigger_node() else {
            let _ = event_queue.send(Event::new(&Message {
                pid: ctx.pid(),
                nid: "".to_string(),
                event: GraphEvent::Workflow(WorkflowEvent::Failed(WorkflowFailedEvent {
                    error: FlowletError::MalformedConfig("no trigger node in workflow graph".to_string()).to_string(),
                })),
            }));
            return;
        };

        let deadline_at = deadline.map(|d| Instant::now() + d);
        let mut visited: HashSet<NodeId> = HashSet::new();

        match Self::walk(&ctx, &graph, deadline_at, &mut visited, trigger.id.clone(), Vars::new()).await {
            Ok(()) => {
                let _ = event_queue.send(Event::new(&Message {
                    pid: ctx.pid(),
                    nid: "".to_string(),
                    event: GraphEvent::Workflow(WorkflowEvent::Succeeded),
                }));
                ctx.done();
            }
            Err(_) if ctx.is_done() => {
                // aborted mid-walk; the abort event is already out
            }
            Err(e) => {
                let _ = event_queue.send(Event::new(&Message {
                    pid: ctx.pid(),
                    nid: "".to_string(),
                    event: GraphEvent::Workflow(WorkflowEvent::Failed(WorkflowFailedEvent {
                        error: e.to_string(),
                    })),
                }));
            }
        }
    }

    /// Executes one node and recurses into its outgoing edges.
    ///
    /// The visited set is shared across the entire traversal, not
    /// per-branch: a node reachable over several fan-in paths executes
    /// exactly once, on whichever path reaches it first. An error anywhere
    /// aborts the remaining walk; sibling branches ordered after the
    /// failing one never execute.
    async fn walk(
        ctx: &Arc<Context>,
        graph: &Arc<Graph>,
        deadline_at: Option<Instant>,
        visited: &mut HashSet<NodeId>,
        nid: NodeId,
        input: Vars,
    ) -> Result<()> {
        let Some(node) = graph.get_node(&nid) else {
            // unknown node id ends this branch, it is not an error
            return Ok(());
        };
        if !visited.insert(nid.clone()) {
            return Ok(());
        }
        if ctx.is_done() {
            return Err(FlowletError::Runtime("run aborted".to_string()));
        }
        if let Some(at) = deadline_at {
            if Instant::now() >= at {
                return Err(FlowletError::Timeout(format!("run deadline exceeded before executing {}", node.label)));
            }
        }

        let event_queue = ctx.channel().event_queue();

        ctx.emit_log(nid.clone(), format!("Executing {}", node.label));
        let _ = event_queue.send(Event::new(&Message {
            pid: ctx.pid(),
            nid: nid.clone(),
            event: GraphEvent::Node(NodeEvent::Running(utils::time::time_millis())),
        }));

        let out = match node.action.run(ctx.clone(), nid.clone(), &input).await {
            Ok(out) => {
                ctx.emit_log(nid.clone(), format!("✅ {} completed", node.label));
                let _ = event_queue.send(Event::new(&Message {
                    pid: ctx.pid(),
                    nid: nid.clone(),
                    event: GraphEvent::Node(NodeEvent::Succeeded(utils::time::time_millis())),
                }));
                out
            }
            Err(e) => {
                ctx.emit_log(nid.clone(), format!("❌ {} failed: {}", node.label, e));
                let reason = match &e {
                    FlowletError::Timeout(_) => ErrorReason::Timeout,
                    _ => ErrorReason::Failed(e.to_string()),
                };
                let _ = event_queue.send(Event::new(&Message {
                    pid: ctx.pid(),
                    nid: nid.clone(),
                    event: GraphEvent::Node(NodeEvent::Error(reason)),
                }));
                return Err(e);
            }
        };

        let mut merged = input;
        merged.extend(&out);
        ctx.add_output(nid.clone(), merged.clone());

        for edge in graph.outgoing_edges(&nid) {
            let target = edge.target.clone();
            Box::pin(Self::walk(ctx, graph, deadline_at, visited, target, merged.clone())).await?;
        }

        Ok(())
    }
}
