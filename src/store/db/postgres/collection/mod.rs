mod event;
mod log;
mod notification;
mod run;
mod workflow;

use std::sync::Arc;

use sea_query::{Alias as SeaAlias, Cond, Expr as SeaExpr};
use serde_json::Value as JsonValue;

use crate::{
    FlowletError,
    store::query::{Filter, Query},
};

use super::synclient::SynClient;

pub use event::EventCollection;
pub use log::LogCollection;
pub use notification::NotificationCollection;
pub use run::RunCollection;
pub use workflow::WorkflowCollection;

pub(crate) type DbConnection = Arc<SynClient>;

pub(crate) fn map_db_err(err: impl std::error::Error) -> FlowletError {
    FlowletError::Store(err.to_string())
}

/// Translate a store query's filters into a sea-query condition tree.
pub(crate) fn into_query(q: &Query) -> Cond {
    let mut cond = Cond::all();
    for filter in q.filters() {
        cond = match filter {
            Filter::Eq(column, value) => cond.add(SeaExpr::col(SeaAlias::new(column)).eq(into_value(value))),
            Filter::Gt(column, value) => cond.add(SeaExpr::col(SeaAlias::new(column)).gt(into_value(value))),
            Filter::Lt(column, value) => cond.add(SeaExpr::col(SeaAlias::new(column)).lt(into_value(value))),
        };
    }
    cond
}

fn into_value(value: &JsonValue) -> sea_query::Value {
    match value {
        JsonValue::String(s) => s.clone().into(),
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or(0.0).into(),
        },
        other => other.to_string().into(),
    }
}
