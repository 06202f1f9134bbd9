//! # Flowlet
//!
//! Flowlet is a lightweight run engine for no-code automation workflows.
//! It is designed to be embedded in the application that owns the workflow
//! documents (a dashboard, a SaaS backend) and to execute user-authored
//! node/edge graphs on demand.
//!
//! ## Core Features
//!
//! - **Graph Execution**: workflows are JSON graphs of trigger, action and
//!   condition nodes; a run walks the graph depth-first from its trigger
//! - **Run Records**: every run is persisted with status, duration and an
//!   ordered log trace
//! - **Operational Alerts**: failure bursts and usage thresholds derive
//!   notifications from run outcomes
//! - **Pluggable Storage**: supports in-memory storage (testing) and
//!   PostgreSQL (production)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowlet::{EngineBuilder, WorkflowModel};
//!
//! let engine = EngineBuilder::new().build()?;
//! engine.launch();
//!
//! // Deploy, activate and run a workflow
//! let workflow = WorkflowModel::from_json(json_str)?;
//! engine.deploy(&workflow)?;
//! engine.activate(&workflow.id)?;
//! let run = engine.start_run(&workflow.id, "user_1")?;
//! ```

mod builder;
mod common;
mod config;
mod engine;
mod error;
mod events;
mod model;
mod runtime;
mod store;
mod utils;
mod walker;
mod workflow;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use config::{Config, PostgresConfig, RunConfig, StoreConfig, StoreType};
pub use engine::Engine;
pub use error::FlowletError;
pub use model::*;
pub use runtime::{ChannelEvent, ChannelOptions, Run};
pub use store::{Store, data};

/// Result type alias for Flowlet operations.
pub type Result<T> = std::result::Result<T, FlowletError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
