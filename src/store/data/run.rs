use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// State of a run record. Exactly one terminal transition happens per run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    #[default]
    Running,
    Success,
    Failed,
}

/// One execution attempt of a workflow.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Run {
    pub id: String,
    pub wid: String,
    /// owning organization, copied from the workflow
    pub oid: String,
    /// user that started the run
    pub uid: String,

    /// one of the `RunState` names
    pub state: String,
    pub category: String,
    /// wall-clock duration in seconds, set on the terminal transition
    pub duration: i64,
    pub cost: Option<f64>,
    pub err: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub timestamp: i64,
}

impl DbCollectionIden for Run {
    fn iden() -> StoreIden {
        StoreIden::Runs
    }
}
