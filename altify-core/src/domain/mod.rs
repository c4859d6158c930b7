//! Core domain types shared by every Altify component.

mod message;
mod task;

pub use message::TaskMessage;
pub use task::{Status, Task};
