//! `lapin`-backed [`Broker`](altify_core::ports::Broker) adapter: durable
//! queues, publisher confirms, and dead-letter-exchange routing over plain
//! AMQP 0-9-1 (RabbitMQ).

mod broker;
mod consumer;
mod delivery;
mod topology;

pub use broker::LapinBroker;
pub use consumer::LapinConsumer;
pub use delivery::LapinDelivery;
