//! Notification threshold rules.
//!
//! Derives operational alerts from run outcomes, decoupled from the graph
//! walker: the monitor calls [`evaluate`] once per finalized run. Both
//! rules count over a trailing 24 hour window and are deliberately not
//! deduplicated — once a threshold is crossed, every further qualifying
//! run emits another notification.

use std::sync::Arc;

use serde_json::json;

use crate::{
    Result,
    store::{
        Store,
        data::{Notification, NotificationKind, Run, RunState, Severity},
        query::{Filter, Query},
    },
    utils,
};

/// Failed runs of one workflow within the window before an alert fires.
pub const FAILURE_BURST_THRESHOLD: usize = 3;
/// Total runs of one organization within the window before an alert fires.
pub const USAGE_THRESHOLD: usize = 80;

/// Evaluate both threshold rules against a run that just reached a
/// terminal state.
pub fn evaluate(
    store: &Arc<Store>,
    run: &Run,
) -> Result<()> {
    let cutoff = utils::time::time_millis() - utils::time::DAY_MILLIS;

    if run.state == RunState::Failed.as_ref() {
        let failed = store
            .runs()
            .query(
                &Query::new()
                    .filter(Filter::Eq("wid".to_string(), json!(run.wid)))
                    .filter(Filter::Eq("state".to_string(), json!(RunState::Failed.as_ref())))
                    .filter(Filter::Gt("start_time".to_string(), json!(cutoff))),
            )?
            .count;
        if failed >= FAILURE_BURST_THRESHOLD {
            notify(
                store,
                &run.oid,
                NotificationKind::WorkflowFailed,
                Severity::Error,
                format!("Workflow {} failed {} times in the last 24 hours", run.wid, failed),
            )?;
        }
    }

    let usage = store
        .runs()
        .query(
            &Query::new()
                .filter(Filter::Eq("oid".to_string(), json!(run.oid)))
                .filter(Filter::Gt("start_time".to_string(), json!(cutoff))),
        )?
        .count;
    if usage >= USAGE_THRESHOLD {
        notify(
            store,
            &run.oid,
            NotificationKind::UsageThreshold,
            Severity::Warning,
            format!("Organization has used {} runs in the last 24 hours", usage),
        )?;
    }

    Ok(())
}

fn notify(
    store: &Arc<Store>,
    oid: &str,
    kind: NotificationKind,
    severity: Severity,
    message: String,
) -> Result<()> {
    store.notifications().create(&Notification {
        id: utils::longid(),
        oid: oid.to_string(),
        kind: kind.as_ref().to_string(),
        severity: severity.as_ref().to_string(),
        message,
        read_time: None,
        timestamp: utils::time::time_millis(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        store::{
            DbStore, MemStore, Store,
            data::{Notification, NotificationKind, Run, RunState},
            query::{Filter, Query},
        },
        utils,
    };
    use serde_json::json;

    use super::{FAILURE_BURST_THRESHOLD, USAGE_THRESHOLD, evaluate};

    fn mem_store() -> Arc<Store> {
        let store = Store::new();
        MemStore::new().init(&store);
        Arc::new(store)
    }

    fn run(
        id: &str,
        wid: &str,
        oid: &str,
        state: RunState,
        start_time: i64,
    ) -> Run {
        Run {
            id: id.to_string(),
            wid: wid.to_string(),
            oid: oid.to_string(),
            uid: "user_1".to_string(),
            state: state.as_ref().to_string(),
            category: "automation".to_string(),
            duration: 0,
            cost: None,
            err: Some("boom".to_string()),
            start_time,
            end_time: start_time,
            timestamp: start_time,
        }
    }

    fn notifications_of_kind(
        store: &Arc<Store>,
        kind: NotificationKind,
    ) -> Vec<Notification> {
        store
            .notifications()
            .query(&Query::new().filter(Filter::Eq("kind".to_string(), json!(kind.as_ref()))))
            .unwrap()
            .rows
    }

    #[test]
    fn failure_burst_fires_at_threshold_and_is_not_deduplicated() {
        let store = mem_store();
        let now = utils::time::time_millis();

        for i in 0..FAILURE_BURST_THRESHOLD - 1 {
            let r = run(&format!("r{}", i), "w1", "org_1", RunState::Failed, now - 1000);
            store.runs().create(&r).unwrap();
            evaluate(&store, &r).unwrap();
        }
        assert!(notifications_of_kind(&store, NotificationKind::WorkflowFailed).is_empty());

        let r = run("r_threshold", "w1", "org_1", RunState::Failed, now - 500);
        store.runs().create(&r).unwrap();
        evaluate(&store, &r).unwrap();
        let alerts = notifications_of_kind(&store, NotificationKind::WorkflowFailed);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, "error");
        assert_eq!(alerts[0].oid, "org_1");

        // a fourth failure emits again
        let r = run("r_again", "w1", "org_1", RunState::Failed, now);
        store.runs().create(&r).unwrap();
        evaluate(&store, &r).unwrap();
        assert_eq!(notifications_of_kind(&store, NotificationKind::WorkflowFailed).len(), 2);
    }

    #[test]
    fn failures_outside_the_window_do_not_count() {
        let store = mem_store();
        let now = utils::time::time_millis();
        let stale = now - utils::time::DAY_MILLIS - 1000;

        for i in 0..FAILURE_BURST_THRESHOLD {
            let start = if i == 0 { stale } else { now - 1000 };
            let r = run(&format!("r{}", i), "w1", "org_1", RunState::Failed, start);
            store.runs().create(&r).unwrap();
        }
        let fresh = store.runs().find("r2").unwrap();
        evaluate(&store, &fresh).unwrap();
        assert!(notifications_of_kind(&store, NotificationKind::WorkflowFailed).is_empty());
    }

    #[test]
    fn usage_threshold_fires_for_org_volume() {
        let store = mem_store();
        let now = utils::time::time_millis();

        for i in 0..USAGE_THRESHOLD - 1 {
            store.runs().create(&run(&format!("r{}", i), "w_any", "org_1", RunState::Success, now - 1000)).unwrap();
        }
        let last = run("r_last", "w_any", "org_1", RunState::Success, now);
        store.runs().create(&last).unwrap();
        evaluate(&store, &last).unwrap();

        let alerts = notifications_of_kind(&store, NotificationKind::UsageThreshold);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, "warning");
    }

    #[test]
    fn other_org_runs_do_not_trip_usage() {
        let store = mem_store();
        let now = utils::time::time_millis();

        for i in 0..USAGE_THRESHOLD {
            store.runs().create(&run(&format!("r{}", i), "w_any", "org_other", RunState::Success, now - 1000)).unwrap();
        }
        let mine = run("r_mine", "w_any", "org_1", RunState::Success, now);
        store.runs().create(&mine).unwrap();
        evaluate(&store, &mine).unwrap();
        assert!(notifications_of_kind(&store, NotificationKind::UsageThreshold).is_empty());
    }

    #[test]
    fn unread_badge_counts_recent_or_unread() {
        let store = mem_store();
        let now = utils::time::time_millis();
        let stale = now - utils::time::DAY_MILLIS - 1000;

        let mk = |id: &str, read: Option<i64>, ts: i64| Notification {
            id: id.to_string(),
            oid: "org_1".to_string(),
            kind: NotificationKind::System.as_ref().to_string(),
            severity: "info".to_string(),
            message: "m".to_string(),
            read_time: read,
            timestamp: ts,
        };

        store.notifications().create(&mk("n_recent_read", Some(now), now)).unwrap();
        store.notifications().create(&mk("n_recent_unread", None, now)).unwrap();
        store.notifications().create(&mk("n_stale_unread", None, stale)).unwrap();
        store.notifications().create(&mk("n_stale_read", Some(stale), stale)).unwrap();

        // recent (read or not) + stale-but-unread
        assert_eq!(store.unread_notifications("org_1").unwrap(), 3);

        store.mark_notification_read("n_recent_unread").unwrap();
        let read = store.notifications().find("n_recent_unread").unwrap();
        assert!(read.read_time.is_some());
        // still within 24h, so the badge count is unchanged
        assert_eq!(store.unread_notifications("org_1").unwrap(), 3);
    }
}
