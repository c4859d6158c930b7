//! Broker (BK) adapter contract (spec §4.5, §6).

use async_trait::async_trait;

use crate::error::Result;

/// Queue depth as reported by the broker's observability API (spec §4.4 step 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueDepth {
    pub ready: u64,
    pub unacked: u64,
}

/// A single delivered message, boxed so concrete brokers (AMQP, in-memory
/// fake) can carry their own ack/nack machinery behind the trait object.
///
/// Spec §4.5: "handler returns ack|nack_requeue|nack_dlq" — represented here
/// as three consuming methods rather than a return-value enum, so a delivery
/// can only be resolved once (the type system forbids acking twice).
#[async_trait]
pub trait Delivery: Send {
    fn body(&self) -> &[u8];

    /// Delivery attempt count as seen by the broker (from the `x-death`
    /// header on AMQP; spec §4.3 step 1: "derive `attempts` from the
    /// `x-death` header (authoritative)").
    fn delivery_count(&self) -> u32;

    /// Acknowledge successful processing.
    async fn ack(self: Box<Self>) -> Result<()>;

    /// Negative-acknowledge and requeue onto the same queue (used by the
    /// worker only when the ack itself failed, spec §5).
    async fn nack_requeue(self: Box<Self>) -> Result<()>;

    /// Negative-acknowledge without requeue; the broker's dead-letter
    /// exchange routes this to the paired DLQ (spec §4.2 step 7).
    async fn nack_dlq(self: Box<Self>) -> Result<()>;
}

/// An open consumer handle on one queue (spec §4.5: `Consume(queue, handler, prefetch)`).
#[async_trait]
pub trait Consumer: Send {
    /// Receive the next delivery, or `None` if the consumer has been closed.
    async fn recv(&mut self) -> Option<Result<Box<dyn Delivery>>>;
}

/// Durable FIFO work queue with a paired dead-letter queue (spec §2, component 3).
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish one message to `queue` with publisher confirms enabled.
    /// `delay` routes through a `tasks.wait.<delay_ms>` queue when set
    /// (spec §4.3's delayed-retry pattern); `None` publishes directly.
    async fn publish(
        &self,
        queue: &str,
        body: Vec<u8>,
        delay: Option<std::time::Duration>,
    ) -> Result<()>;

    /// Open a consumer on `queue` with the given prefetch count.
    async fn consume(&self, queue: &str, prefetch: u16) -> Result<Box<dyn Consumer>>;

    /// Current `(ready, unacked)` depth of `queue` (spec §4.4 step 1).
    async fn queue_depth(&self, queue: &str) -> Result<QueueDepth>;
}
