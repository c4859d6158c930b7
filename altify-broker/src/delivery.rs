//! [`Delivery`] over a `lapin::message::Delivery`.

use altify_core::error::{AltifyError, Result};
use altify_core::ports::Delivery;
use async_trait::async_trait;
use lapin::options::{BasicAckOptions, BasicRejectOptions};
use lapin::types::AMQPValue;

pub struct LapinDelivery {
    inner: lapin::message::Delivery,
    delivery_count: u32,
}

impl LapinDelivery {
    pub fn new(inner: lapin::message::Delivery) -> Self {
        let delivery_count = delivery_count_from_headers(&inner);
        Self { inner, delivery_count }
    }
}

/// Spec §4.3 step 1: "derive `attempts` from the `x-death` header
/// (authoritative)". RabbitMQ appends one entry per dead-letter hop to the
/// `x-death` array; a quorum queue redelivery instead sets the flatter
/// `x-delivery-count` integer header. Either is authoritative on its own, so
/// we prefer whichever is present.
fn delivery_count_from_headers(delivery: &lapin::message::Delivery) -> u32 {
    let Some(headers) = delivery.properties.headers().as_ref() else {
        return 0;
    };

    if let Some(AMQPValue::LongLongInt(n)) = headers.inner().get("x-delivery-count") {
        return (*n).max(0) as u32;
    }

    let Some(AMQPValue::FieldArray(deaths)) = headers.inner().get("x-death") else {
        return 0;
    };
    deaths
        .as_slice()
        .iter()
        .filter_map(|entry| match entry {
            AMQPValue::FieldTable(table) => match table.inner().get("count") {
                Some(AMQPValue::LongLongInt(n)) => Some((*n).max(0) as u32),
                _ => None,
            },
            _ => None,
        })
        .sum()
}

#[async_trait]
impl Delivery for LapinDelivery {
    fn body(&self) -> &[u8] {
        &self.inner.data
    }

    fn delivery_count(&self) -> u32 {
        self.delivery_count
    }

    async fn ack(self: Box<Self>) -> Result<()> {
        self.inner
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| AltifyError::Unavailable(format!("ack failed: {e}")))
    }

    async fn nack_requeue(self: Box<Self>) -> Result<()> {
        self.inner
            .reject(BasicRejectOptions { requeue: true })
            .await
            .map_err(|e| AltifyError::Unavailable(format!("nack (requeue) failed: {e}")))
    }

    async fn nack_dlq(self: Box<Self>) -> Result<()> {
        self.inner
            .reject(BasicRejectOptions { requeue: false })
            .await
            .map_err(|e| AltifyError::Unavailable(format!("nack (dlq) failed: {e}")))
    }
}
