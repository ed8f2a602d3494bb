//! Defines routes for the relay.
//!
//! ## Structure
//! - `POST /`        — event invocation endpoint (one storage event per call)
//! - `GET  /healthz` — liveness
//! - `GET  /readyz`  — readiness (destination topic reachable and present)

use crate::handlers::{
    AppState,
    event_handlers::handle_event,
    health_handlers::{healthz, readyz},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router.
///
/// The router carries shared state ([`AppState`]) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/", post(handle_event))
}
