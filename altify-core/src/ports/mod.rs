//! Capability traits for every external collaborator: Blob Store, Relational
//! Store, Broker, Inferencer, Orchestrator.
//!
//! Concrete implementations live in `altify-store` (BS/RS), `altify-broker`
//! (BK), and the worker/autoscaler crates (Inferencer/Orchestrator). Each
//! trait also has an in-memory fake in [`crate::fakes`] for unit and
//! integration tests.

mod blob_store;
mod broker;
mod inferencer;
mod orchestrator;
mod relational_store;

pub use blob_store::BlobStore;
pub use broker::{Broker, Consumer, Delivery, QueueDepth};
pub use inferencer::{Inferencer, InferencerFailure};
pub use orchestrator::Orchestrator;
pub use relational_store::RelationalStore;
