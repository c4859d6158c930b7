//! In-memory fakes for every port, so every other crate can write tests
//! against the pipeline's logic without a running Postgres/RabbitMQ/blob
//! store.

mod blob_store;
mod broker;
mod inferencer;
mod orchestrator;
mod relational_store;

pub use blob_store::FakeBlobStore;
pub use broker::FakeBroker;
pub use inferencer::{Outcome, ScriptedInferencer};
pub use orchestrator::FakeOrchestrator;
pub use relational_store::FakeRelationalStore;
