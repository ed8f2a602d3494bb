//! HTTP handlers: the event invocation endpoint and the health probes.

pub mod event_handlers;
pub mod health_handlers;

use crate::services::publish_service::PublishService;
use std::time::Duration;

/// Shared state carried by the router to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Publish pipeline, shared across invocations.
    pub publisher: PublishService,

    /// Destination topic for every invocation in this process.
    pub topic_id: String,

    /// Ceiling on a single invocation's publish attempt, retries included.
    pub invocation_deadline: Duration,
}
