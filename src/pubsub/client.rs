//! Pub/Sub backend trait and its REST implementation.
//!
//! The relay only needs two backend operations: "does this topic exist"
//! and "publish one message". Both live behind [`PubSubBackend`] so the
//! publish service can be exercised against a mock in tests.

use crate::pubsub::retry::FaultClass;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// A classified backend failure.
///
/// `class` drives retry decisions; `message` carries enough context to
/// diagnose the fault without re-running the invocation.
#[derive(Debug, Clone, Error)]
#[error("{class}: {message}")]
pub struct BackendFault {
    pub class: FaultClass,
    pub message: String,
}

impl BackendFault {
    pub fn new(class: FaultClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}

/// Transport-ready message envelope: the serialized topic message plus
/// fixed provenance attributes. Built immediately before dispatch and
/// never reused.
#[derive(Debug, Clone)]
pub struct DeliveryEnvelope {
    pub data: Bytes,
    pub attributes: HashMap<String, String>,
}

/// The messaging backend capability used by the publish service.
#[async_trait]
pub trait PubSubBackend: Send + Sync {
    /// Check whether the named topic exists.
    async fn topic_exists(&self, topic_id: &str) -> Result<bool, BackendFault>;

    /// Publish one envelope to the named topic and return the
    /// backend-assigned delivery identifier.
    async fn publish(&self, topic_id: &str, envelope: &DeliveryEnvelope)
    -> Result<String, BackendFault>;
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    data: String,
    attributes: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageIds", default)]
    message_ids: Vec<String>,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pub/Sub client over the REST surface.
///
/// One instance per process, shared across invocations; it holds only the
/// connection pool and addressing configuration, never per-invocation
/// state. Pointing `endpoint` at an emulator works without a token.
pub struct HttpPubSubClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    auth_token: Option<String>,
}

impl HttpPubSubClient {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        auth_token: Option<String>,
    ) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            auth_token,
        })
    }

    fn topic_url(&self, topic_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}",
            self.endpoint, self.project_id, topic_id
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Classify a reqwest transport failure (no HTTP status available).
    fn classify_transport(err: &reqwest::Error) -> FaultClass {
        if err.is_timeout() {
            FaultClass::DeadlineExceeded
        } else if err.is_connect() {
            FaultClass::Unavailable
        } else {
            FaultClass::Unknown
        }
    }

    async fn fault_from_response(resp: reqwest::Response) -> BackendFault {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        BackendFault::new(
            FaultClass::from_status(status.as_u16()),
            format!("backend returned {status}: {body}"),
        )
    }
}

#[async_trait]
impl PubSubBackend for HttpPubSubClient {
    async fn topic_exists(&self, topic_id: &str) -> Result<bool, BackendFault> {
        let resp = self
            .authorize(self.http.get(self.topic_url(topic_id)))
            .send()
            .await
            .map_err(|err| {
                BackendFault::new(
                    Self::classify_transport(&err),
                    format!("topic lookup failed: {err}"),
                )
            })?;

        let status = resp.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(Self::fault_from_response(resp).await)
        }
    }

    async fn publish(
        &self,
        topic_id: &str,
        envelope: &DeliveryEnvelope,
    ) -> Result<String, BackendFault> {
        let body = PublishRequest {
            messages: vec![WireMessage {
                data: general_purpose::STANDARD.encode(&envelope.data),
                attributes: &envelope.attributes,
            }],
        };

        let resp = self
            .authorize(
                self.http
                    .post(format!("{}:publish", self.topic_url(topic_id))),
            )
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                BackendFault::new(
                    Self::classify_transport(&err),
                    format!("publish request failed: {err}"),
                )
            })?;

        if !resp.status().is_success() {
            return Err(Self::fault_from_response(resp).await);
        }

        let parsed: PublishResponse = resp.json().await.map_err(|err| {
            BackendFault::new(
                FaultClass::Unknown,
                format!("unreadable publish response: {err}"),
            )
        })?;

        parsed.message_ids.into_iter().next().ok_or_else(|| {
            BackendFault::new(
                FaultClass::Unknown,
                "backend acknowledged publish without a message id",
            )
        })
    }
}
