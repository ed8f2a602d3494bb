//! The event envelope delivered by the hosting runtime.

use serde::Deserialize;

/// A single invocation's event envelope.
///
/// The runtime delivers one envelope per invocation; the payload under
/// `data` is opaque here and is decoded into a
/// [`StorageObjectData`](crate::models::storage_object::StorageObjectData)
/// by the handler. Unknown envelope fields (specversion, source, ...) are
/// ignored.
#[derive(Deserialize, Clone, Debug)]
pub struct EventEnvelope {
    /// Runtime-assigned event identifier.
    pub id: String,

    /// Event type tag (e.g. `google.cloud.storage.object.v1.finalized`).
    #[serde(rename = "type")]
    pub event_type: String,

    /// Opaque event payload.
    pub data: serde_json::Value,
}
