//! [`Consumer`] over a `lapin::Consumer` stream.

use altify_core::error::{AltifyError, Result};
use altify_core::ports::{Consumer, Delivery};
use async_trait::async_trait;
use futures::StreamExt;

use crate::delivery::LapinDelivery;

pub struct LapinConsumer {
    inner: lapin::Consumer,
}

impl LapinConsumer {
    pub fn new(inner: lapin::Consumer) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Consumer for LapinConsumer {
    async fn recv(&mut self) -> Option<Result<Box<dyn Delivery>>> {
        match self.inner.next().await? {
            Ok(delivery) => Some(Ok(Box::new(LapinDelivery::new(delivery)))),
            Err(e) => Some(Err(AltifyError::Unavailable(format!("consume error: {e}")))),
        }
    }
}
