//! The invocation handler: one storage event in, one published message
//! out (or exactly one classified failure).

use crate::{
    errors::AppError,
    handlers::AppState,
    models::{event::EventEnvelope, storage_object::StorageObjectData},
    services::transform_service,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Serialize)]
pub struct PublishedResponse {
    pub delivery_id: String,
}

/// `POST /`
///
/// Receives the runtime's event envelope, decodes the storage object it
/// carries, maps it to a topic message and publishes it. The publish path
/// runs under a cancellation scope armed with the configured invocation
/// deadline so retries never outlive the invocation.
pub async fn handle_event(
    State(state): State<AppState>,
    Json(envelope): Json<EventEnvelope>,
) -> Result<impl IntoResponse, AppError> {
    info!(
        event_id = %envelope.id,
        event_type = %envelope.event_type,
        "received storage event"
    );

    let data: StorageObjectData = serde_json::from_value(envelope.data)
        .map_err(|err| AppError::bad_request(format!("unable to process event data: {err}")))?;

    let msg = transform_service::to_topic_message(&data)?;

    let cancel = CancellationToken::new();
    let deadline = state.invocation_deadline;
    let timer = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(deadline).await;
            cancel.cancel();
        }
    });

    let result = state.publisher.publish(&cancel, &state.topic_id, msg).await;
    timer.abort();
    let delivery_id = result?;

    info!(event_id = %envelope.id, delivery_id = %delivery_id, "published message");
    Ok((StatusCode::OK, Json(PublishedResponse { delivery_id })))
}
