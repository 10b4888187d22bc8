// Hand-off between the process stage and the enrichment workers.
// Delivery is at-least-once: a failed message goes back on the queue with
// its delivery count bumped, and every consumer must tolerate replays.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How many deliveries a message gets before it is dropped with an error.
pub const MAX_DELIVERIES: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery<T> {
    pub message: T,
    pub attempt: u32,
}

#[async_trait]
pub trait ItemQueue<T: Send + 'static>: Send + Sync {
    async fn send(&self, message: T) -> Result<()>;

    /// Redeliver a failed message with its attempt count carried over.
    async fn requeue(&self, delivery: Delivery<T>) -> Result<()>;

    /// Pop the next delivery, or None when the queue is drained.
    async fn receive(&self) -> Result<Option<Delivery<T>>>;
}

/// Process-local queue. Stands in for a managed message queue when the
/// whole pipeline runs in one binary.
pub struct MemoryQueue<T> {
    inner: Mutex<VecDeque<Delivery<T>>>,
}

impl<T> MemoryQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Default for MemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> ItemQueue<T> for MemoryQueue<T> {
    async fn send(&self, message: T) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .push_back(Delivery { message, attempt: 1 });
        Ok(())
    }

    async fn requeue(&self, delivery: Delivery<T>) -> Result<()> {
        self.inner.lock().unwrap().push_back(delivery);
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery<T>>> {
        Ok(self.inner.lock().unwrap().pop_front())
    }
}
