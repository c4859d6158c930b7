use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::ports::{Broker, Consumer, Delivery, QueueDepth};

struct Envelope {
    body: Vec<u8>,
    delivery_count: u32,
}

struct State {
    queues: Mutex<HashMap<String, VecDeque<Envelope>>>,
    unacked: Mutex<HashMap<String, u64>>,
    /// Main queue name -> its paired DLQ name, so `nack_dlq` knows where to route.
    dlx: HashMap<String, String>,
    closed: AtomicBool,
}

/// In-memory [`Broker`]. Supports the same publish/consume/queue-depth shape
/// as the real AMQP adapter, including delayed republish (spawns a task that
/// sleeps then enqueues, the same mechanic as a `tasks.wait.<delay_ms>` TTL
/// queue) and DLQ routing on `nack_dlq` (configured via `with_dlx`).
pub struct FakeBroker {
    state: Arc<State>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(State {
                queues: Mutex::new(HashMap::new()),
                unacked: Mutex::new(HashMap::new()),
                dlx: HashMap::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Configure dead-letter routing: messages `nack_dlq`'d off `main` land on `dlq`.
    pub fn with_dlx(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            state: Arc::new(State {
                queues: Mutex::new(HashMap::new()),
                unacked: Mutex::new(HashMap::new()),
                dlx: pairs.into_iter().collect(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Stop all open consumers (they return `None` once their queue drains).
    pub fn shutdown(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

impl Default for FakeBroker {
    fn default() -> Self {
        Self::new()
    }
}

async fn push(state: &Arc<State>, queue: &str, envelope: Envelope) {
    let mut queues = state.queues.lock().await;
    queues.entry(queue.to_string()).or_default().push_back(envelope);
}

#[async_trait]
impl Broker for FakeBroker {
    async fn publish(&self, queue: &str, body: Vec<u8>, delay: Option<Duration>) -> Result<()> {
        let envelope = Envelope { body, delivery_count: 0 };
        match delay {
            None => push(&self.state, queue, envelope).await,
            Some(delay) => {
                let state = Arc::clone(&self.state);
                let queue = queue.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    push(&state, &queue, envelope).await;
                });
            }
        }
        Ok(())
    }

    async fn consume(&self, queue: &str, _prefetch: u16) -> Result<Box<dyn Consumer>> {
        Ok(Box::new(FakeConsumer {
            state: Arc::clone(&self.state),
            queue: queue.to_string(),
        }))
    }

    async fn queue_depth(&self, queue: &str) -> Result<QueueDepth> {
        let queues = self.state.queues.lock().await;
        let ready = queues.get(queue).map(|q| q.len() as u64).unwrap_or(0);
        let unacked = *self.state.unacked.lock().await.get(queue).unwrap_or(&0);
        Ok(QueueDepth { ready, unacked })
    }
}

struct FakeConsumer {
    state: Arc<State>,
    queue: String,
}

#[async_trait]
impl Consumer for FakeConsumer {
    async fn recv(&mut self) -> Option<Result<Box<dyn Delivery>>> {
        loop {
            {
                let mut queues = self.state.queues.lock().await;
                if let Some(envelope) = queues.get_mut(&self.queue).and_then(VecDeque::pop_front) {
                    *self.state.unacked.lock().await.entry(self.queue.clone()).or_insert(0) += 1;
                    return Some(Ok(Box::new(FakeDelivery {
                        state: Arc::clone(&self.state),
                        queue: self.queue.clone(),
                        body: envelope.body,
                        delivery_count: envelope.delivery_count,
                    })));
                }
            }
            if self.state.closed.load(Ordering::SeqCst) {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

struct FakeDelivery {
    state: Arc<State>,
    queue: String,
    body: Vec<u8>,
    delivery_count: u32,
}

impl FakeDelivery {
    async fn mark_acked(&self) {
        let mut unacked = self.state.unacked.lock().await;
        if let Some(count) = unacked.get_mut(&self.queue) {
            *count = count.saturating_sub(1);
        }
    }
}

#[async_trait]
impl Delivery for FakeDelivery {
    fn body(&self) -> &[u8] {
        &self.body
    }

    fn delivery_count(&self) -> u32 {
        self.delivery_count
    }

    async fn ack(self: Box<Self>) -> Result<()> {
        self.mark_acked().await;
        Ok(())
    }

    async fn nack_requeue(self: Box<Self>) -> Result<()> {
        self.mark_acked().await;
        push(
            &self.state,
            &self.queue,
            Envelope { body: self.body, delivery_count: self.delivery_count + 1 },
        )
        .await;
        Ok(())
    }

    async fn nack_dlq(self: Box<Self>) -> Result<()> {
        self.mark_acked().await;
        if let Some(dlq) = self.state.dlx.get(&self.queue).cloned() {
            push(
                &self.state,
                &dlq,
                Envelope { body: self.body, delivery_count: self.delivery_count + 1 },
            )
            .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_consume_round_trips_body() {
        let broker = FakeBroker::new();
        broker.publish("tasks.main", b"hello".to_vec(), None).await.unwrap();
        let mut consumer = broker.consume("tasks.main", 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        assert_eq!(delivery.body(), b"hello");
        assert_eq!(delivery.delivery_count(), 0);
        delivery.ack().await.unwrap();

        let depth = broker.queue_depth("tasks.main").await.unwrap();
        assert_eq!(depth.ready, 0);
        assert_eq!(depth.unacked, 0);
    }

    #[tokio::test]
    async fn nack_dlq_routes_through_configured_dlx() {
        let broker = FakeBroker::with_dlx([("tasks.main".to_string(), "tasks.dlq".to_string())]);
        broker.publish("tasks.main", b"payload".to_vec(), None).await.unwrap();

        let mut consumer = broker.consume("tasks.main", 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        delivery.nack_dlq().await.unwrap();

        let dlq_depth = broker.queue_depth("tasks.dlq").await.unwrap();
        assert_eq!(dlq_depth.ready, 1);

        let mut dlq_consumer = broker.consume("tasks.dlq", 1).await.unwrap();
        let dead = dlq_consumer.recv().await.unwrap().unwrap();
        assert_eq!(dead.delivery_count(), 1);
    }

    #[tokio::test]
    async fn delayed_publish_is_not_immediately_ready() {
        let broker = FakeBroker::new();
        broker
            .publish("tasks.wait.1000", b"later".to_vec(), Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(broker.queue_depth("tasks.wait.1000").await.unwrap().ready, 0);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(broker.queue_depth("tasks.wait.1000").await.unwrap().ready, 1);
    }
}
