//! [`Broker`] over a `lapin` connection/channel, with publisher confirms
//! enabled (spec §4.5: "Publish(queue, msg)" is acknowledged only once the
//! broker has confirmed the write).

use std::time::Duration;

use altify_core::error::{AltifyError, Result};
use altify_core::ports::{Broker, Consumer, QueueDepth};
use async_trait::async_trait;
use lapin::options::{BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

use crate::consumer::LapinConsumer;
use crate::topology;

pub struct LapinBroker {
    // Kept alive for the lifetime of the broker: dropping it closes every channel.
    _connection: Connection,
    channel: Channel,
    dlq_queue: String,
}

impl LapinBroker {
    /// Connect to `addr` (an `amqp://` URI) and open one confirm-mode channel.
    pub async fn connect(addr: &str, dlq_queue: impl Into<String>) -> Result<Self> {
        let connection = Connection::connect(addr, ConnectionProperties::default())
            .await
            .map_err(|e| AltifyError::Unavailable(format!("amqp connect: {e}")))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| AltifyError::Unavailable(format!("amqp channel: {e}")))?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| AltifyError::Unavailable(format!("amqp confirm_select: {e}")))?;
        Ok(Self { _connection: connection, channel, dlq_queue: dlq_queue.into() })
    }

    /// Declare `tasks.main` (dead-lettering to the DLQ queue) and the DLQ
    /// queue itself. Call once at process startup before publishing or
    /// consuming (spec §6 topology).
    pub async fn ensure_topology(&self, main_queue: &str) -> Result<()> {
        topology::declare_main(&self.channel, main_queue, &self.dlq_queue)
            .await
            .map_err(|e| AltifyError::Unavailable(format!("declare {main_queue}: {e}")))?;
        topology::declare_dlq(&self.channel, &self.dlq_queue)
            .await
            .map_err(|e| AltifyError::Unavailable(format!("declare {}: {e}", self.dlq_queue)))?;
        Ok(())
    }
}

#[async_trait]
impl Broker for LapinBroker {
    async fn publish(&self, queue: &str, body: Vec<u8>, delay: Option<Duration>) -> Result<()> {
        let target = match delay {
            None => queue.to_string(),
            Some(delay) => {
                let delay_ms = delay.as_millis() as u64;
                let wait_queue = altify_core::config::queues::wait(delay_ms);
                topology::declare_wait_queue(&self.channel, &wait_queue, delay_ms, queue)
                    .await
                    .map_err(|e| AltifyError::Unavailable(format!("declare {wait_queue}: {e}")))?;
                wait_queue
            }
        };

        let confirm = self
            .channel
            .basic_publish(
                "",
                &target,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|e| AltifyError::Unavailable(format!("publish to {target}: {e}")))?;
        confirm
            .await
            .map_err(|e| AltifyError::Unavailable(format!("publisher confirm for {target}: {e}")))?;
        Ok(())
    }

    async fn consume(&self, queue: &str, prefetch: u16) -> Result<Box<dyn Consumer>> {
        self.channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| AltifyError::Unavailable(format!("basic_qos: {e}")))?;
        let tag = format!("altify-{}-{}", queue, uuid::Uuid::new_v4());
        let consumer = self
            .channel
            .basic_consume(queue, &tag, BasicConsumeOptions::default(), FieldTable::default())
            .await
            .map_err(|e| AltifyError::Unavailable(format!("basic_consume {queue}: {e}")))?;
        Ok(Box::new(LapinConsumer::new(consumer)))
    }

    /// `unacked` is always `0` here: plain AMQP 0-9-1 (`queue.declare` passive)
    /// only reports the ready count. The unacked/redelivered count RabbitMQ
    /// tracks per-queue is exposed over its HTTP management API, not the wire
    /// protocol `lapin` speaks, so an accurate value would mean pulling in an
    /// HTTP client and the management plugin as a dependency of the
    /// autoscaler's hot path. The autoscaler's flap-resistance degrades to
    /// "unconditional scale-up, cooldown-gated scale-down" against this
    /// adapter; see `DESIGN.md`.
    async fn queue_depth(&self, queue: &str) -> Result<QueueDepth> {
        let declared = self
            .channel
            .queue_declare(
                queue,
                QueueDeclareOptions { passive: true, durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(|e| AltifyError::Unavailable(format!("passive declare {queue}: {e}")))?;
        Ok(QueueDepth { ready: declared.message_count() as u64, unacked: 0 })
    }
}
