//! Wire message carried by the broker between ingress and workers (spec §6).

use serde::{Deserialize, Serialize};

/// `{ "id": "<str>", "image_key": "<str>", "context": "<str>" }` (spec §6).
///
/// Unknown fields are rejected (spec §9, "explicit message and DTO records
/// with typed fields; unknown fields rejected").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskMessage {
    pub id: String,
    pub image_key: String,
    pub context: String,
}

impl TaskMessage {
    pub fn new(id: impl Into<String>, image_key: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_key: image_key.into(),
            context: context.into(),
        }
    }

    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("TaskMessage serialization is infallible")
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
