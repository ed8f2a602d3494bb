//! Core data models for the storage-event metadata relay.
//!
//! These entities describe the inbound event envelope, the storage object
//! it carries, and the outbound topic message derived from it. They
//! serialize naturally as JSON via `serde`.

pub mod event;
pub mod storage_object;
pub mod topic_message;
