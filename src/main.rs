use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod pubsub;
mod routes;
mod services;

use handlers::AppState;
use pubsub::{client::HttpPubSubClient, retry::RetryPolicy};
use services::publish_service::PublishService;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        project_id = %cfg.project_id,
        topic_id = %cfg.topic_id,
        endpoint = %cfg.pubsub_endpoint,
        "starting metadata-relay"
    );

    // --- Initialize backend client (shared across invocations) ---
    let client = Arc::new(HttpPubSubClient::new(
        &cfg.pubsub_endpoint,
        &cfg.project_id,
        cfg.auth_token.clone(),
    )?);

    // --- Initialize publish pipeline ---
    let publisher = PublishService::new(client, RetryPolicy::default());
    let state = AppState {
        publisher,
        topic_id: cfg.topic_id.clone(),
        invocation_deadline: cfg.invocation_deadline(),
    };

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let listener = TcpListener::bind(cfg.addr()).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
