//! Core services: the pure storage-event → topic-message transform and
//! the publish pipeline that delivers the result to the backend.

pub mod publish_service;
pub mod transform_service;
