//! Represents the metadata of an object stored in a cloud storage bucket.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Metadata of a storage object as carried by a storage-change event.
///
/// Only `bucket` and `name` are required downstream; everything else is
/// copied through verbatim when present. Missing string fields decode to
/// the empty string, matching the wire format's omitempty convention.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct StorageObjectData {
    /// Bucket holding the object.
    #[serde(default)]
    pub bucket: String,

    /// Object name (path-like key within the bucket).
    #[serde(default)]
    pub name: String,

    /// Metadata-generation token.
    #[serde(default)]
    pub metageneration: String,

    /// When the object was created.
    #[serde(default, rename = "timecreated")]
    pub time_created: Option<DateTime<Utc>>,

    /// When the object was last updated.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,

    /// Content type (MIME type).
    #[serde(default, rename = "contentType")]
    pub content_type: String,

    /// Size in bytes, string-encoded by the storage system.
    #[serde(default)]
    pub size: String,
}
