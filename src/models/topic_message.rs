//! The outbound message published to the destination topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File metadata as delivered to topic subscribers.
///
/// `filepath` is always derived from `bucket` and `filename`, never
/// supplied independently. Empty fields are omitted from the wire form
/// rather than serialized as empty strings or null.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopicMessageData {
    /// Bucket holding the file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bucket: String,

    /// File name within the bucket.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filename: String,

    /// Storage URI of the file, `gs://{bucket}/{filename}`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filepath: String,

    /// Content type (MIME type), if the event carried one.
    #[serde(rename = "contenttype", skip_serializing_if = "String::is_empty")]
    pub content_type: String,

    /// Size in bytes, string-encoded, if the event carried one.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub size: String,

    /// When the file was created, if the event carried it.
    #[serde(rename = "timecreated", skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}
