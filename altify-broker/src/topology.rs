//! Queue topology: `tasks.main`, `tasks.dlq`, and the delayed-retry
//! `tasks.wait.<delay_ms>` queues (spec §4.3, §6).
//!
//! Every queue here routes through the default exchange (`""`), where the
//! routing key is the queue name — including dead-lettering, since RabbitMQ
//! honors `x-dead-letter-exchange=""` the same way a direct publish does.
//! That keeps the topology to plain queue declarations with arguments; no
//! custom exchanges to stand up.

use lapin::options::QueueDeclareOptions;
use lapin::types::{AMQPValue, FieldTable, LongString, LongUInt};
use lapin::{Channel, Queue};

/// Declare `tasks.main`: dead-letters to `tasks.dlq` on `nack_dlq` (basic.reject
/// with `requeue=false`).
pub async fn declare_main(channel: &Channel, main_queue: &str, dlq_queue: &str) -> Result<Queue, lapin::Error> {
    let mut args = FieldTable::default();
    args.insert("x-dead-letter-exchange".into(), AMQPValue::LongString(LongString::from("")));
    args.insert(
        "x-dead-letter-routing-key".into(),
        AMQPValue::LongString(LongString::from(dlq_queue)),
    );
    channel
        .queue_declare(main_queue, QueueDeclareOptions { durable: true, ..Default::default() }, args)
        .await
}

/// Declare the dead-letter queue. Plain durable queue; the DLQ consumer
/// decides whether to re-drive (back onto `tasks.wait.<delay>`) or settle
/// `Failed` (spec §4.3).
pub async fn declare_dlq(channel: &Channel, dlq_queue: &str) -> Result<Queue, lapin::Error> {
    channel
        .queue_declare(
            dlq_queue,
            QueueDeclareOptions { durable: true, ..Default::default() },
            FieldTable::default(),
        )
        .await
}

/// Declare a delayed-retry queue with TTL `delay_ms`: once a message expires
/// here it is dead-lettered back onto `target_queue` for redelivery (spec
/// §4.3's exponential-backoff re-drive).
pub async fn declare_wait_queue(
    channel: &Channel,
    wait_queue: &str,
    delay_ms: u64,
    target_queue: &str,
) -> Result<Queue, lapin::Error> {
    let mut args = FieldTable::default();
    args.insert("x-message-ttl".into(), AMQPValue::LongUInt(delay_ms as LongUInt));
    args.insert("x-dead-letter-exchange".into(), AMQPValue::LongString(LongString::from("")));
    args.insert(
        "x-dead-letter-routing-key".into(),
        AMQPValue::LongString(LongString::from(target_queue)),
    );
    channel
        .queue_declare(wait_queue, QueueDeclareOptions { durable: true, ..Default::default() }, args)
        .await
}
