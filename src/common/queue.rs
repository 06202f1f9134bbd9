//! Message queues for inter-component communication.
//!
//! Provides both point-to-point (Queue) and broadcast (BroadcastQueue)
//! messaging.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{FlowletError, Result};

/// Bounded MPMC queue backed by flume.
///
/// Used for command queues where each message is consumed by exactly one
/// receiver.
#[derive(Clone)]
pub struct Queue<T> {
    receiver: Arc<flume::Receiver<T>>,
    sender: Arc<flume::Sender<T>>,
}

impl<T> Queue<T> {
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, rx) = flume::bounded(cap);

        Arc::new(Self {
            receiver: Arc::new(rx),
            sender: Arc::new(tx),
        })
    }

    pub fn send(
        &self,
        msg: T,
    ) -> Result<()> {
        self.sender.send(msg).map_err(|e| FlowletError::Queue(e.to_string()))
    }

    pub async fn next_async(&self) -> Option<T> {
        self.receiver.recv_async().await.ok()
    }
}

/// Broadcast queue for one-to-many message distribution backed by tokio's
/// broadcast channel. Every subscriber receives every message.
#[derive(Clone)]
pub struct BroadcastQueue<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T: Clone> BroadcastQueue<T> {
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(cap);

        Arc::new(Self {
            sender: Arc::new(tx),
        })
    }

    pub fn send(
        &self,
        msg: T,
    ) -> Result<()> {
        self.sender.send(msg).map_err(|e| FlowletError::Queue(e.to_string()))?;
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}
