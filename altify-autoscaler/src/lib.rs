//! `altify-autoscaler` — queue-depth-driven worker scaling (spec §4.4).

mod autoscaler;
mod orchestrator;
mod settings;

pub use autoscaler::{run, Autoscaler};
pub use orchestrator::LoggingOrchestrator;
pub use settings::{compute_desired, AutoscalerSettings};
