use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// One line of a run's log trace.
///
/// Logs form an append-only sequence per run; `seq` is the per-run
/// ordinal assigned at emission.
#[derive(Default, Deserialize, Serialize, Debug, Clone)]
pub struct Log {
    pub id: String,
    pub pid: String,
    pub nid: String,
    pub seq: i64,

    pub content: String,
    pub timestamp: i64,
}

impl DbCollectionIden for Log {
    fn iden() -> StoreIden {
        StoreIden::Logs
    }
}
