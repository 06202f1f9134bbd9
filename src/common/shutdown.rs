//! Shutdown coordination between long-lived tasks.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

struct Inner {
    terminated: AtomicBool,
    notify: Notify,
}

/// One-shot termination signal shared by the tasks of a component.
///
/// `shutdown` flips the flag and wakes every waiter; `wait` resolves
/// immediately once the flag is set, so late subscribers never hang.
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                terminated: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn shutdown(&self) {
        self.inner.terminated.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::SeqCst)
    }

    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let inner = self.inner.clone();
        async move {
            while !inner.terminated.load(Ordering::SeqCst) {
                let notified = inner.notify.notified();
                // the flag may flip between the load and the registration
                if inner.terminated.load(Ordering::SeqCst) {
                    break;
                }
                notified.await;
            }
        }
    }
}
