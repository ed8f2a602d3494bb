//! Converts inbound storage-object metadata into the outbound topic
//! message. Pure and deterministic: no clock reads, no defaulting, no
//! side effects.

use crate::models::{storage_object::StorageObjectData, topic_message::TopicMessageData};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("invalid input: bucket or name is empty")]
    EmptyBucketOrName,
}

/// Map a storage object descriptor to a topic message.
///
/// `bucket` and `name` are required; everything else is copied through
/// verbatim, empty when absent on input. The file path is always derived
/// as `gs://{bucket}/{name}` and never supplied independently.
pub fn to_topic_message(data: &StorageObjectData) -> Result<TopicMessageData, TransformError> {
    if data.bucket.is_empty() || data.name.is_empty() {
        return Err(TransformError::EmptyBucketOrName);
    }

    Ok(TopicMessageData {
        bucket: data.bucket.clone(),
        filename: data.name.clone(),
        filepath: format!("gs://{}/{}", data.bucket, data.name),
        content_type: data.content_type.clone(),
        size: data.size.clone(),
        time_created: data.time_created,
    })
}
