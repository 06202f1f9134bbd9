use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// What a notification is about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    WorkflowFailed,
    UsageThreshold,
    Suggestion,
    System,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// An operational alert shown on the dashboard.
///
/// Created by the threshold rules; the only mutation is marking it read.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Notification {
    pub id: String,
    /// organization the notification belongs to
    pub oid: String,
    /// one of the `NotificationKind` names
    pub kind: String,
    /// one of the `Severity` names
    pub severity: String,
    pub message: String,
    /// set when the user marks the notification read
    pub read_time: Option<i64>,
    pub timestamp: i64,
}

impl DbCollectionIden for Notification {
    fn iden() -> StoreIden {
        StoreIden::Notifications
    }
}
