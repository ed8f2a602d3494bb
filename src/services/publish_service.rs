//! PublishService — the reliable publish pipeline.
//!
//! One call to [`PublishService::publish`] runs the whole sequence for a
//! single invocation: confirm the destination topic exists, encode the
//! message into a delivery envelope, dispatch it, and await the backend's
//! acknowledgment under the retry policy. Either a single delivery
//! identifier comes back, or a classified error; there is no partial
//! outcome.

use crate::models::topic_message::TopicMessageData;
use crate::pubsub::client::{BackendFault, DeliveryEnvelope, PubSubBackend};
use crate::pubsub::retry::RetryPolicy;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fixed provenance attributes attached to every envelope.
const ATTR_ORIGIN: (&str, &str) = ("origin", "object-storage-event");
const ATTR_PUBLISHER: (&str, &str) = ("publisher", "metadata-relay");

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("topic `{0}` does not exist")]
    TopicNotFound(String),
    #[error("failed to check if topic `{topic_id}` exists: {source}")]
    Backend {
        topic_id: String,
        #[source]
        source: BackendFault,
    },
    #[error("failed to serialize topic message: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to publish message to topic `{topic_id}`: {source}")]
    Publish {
        topic_id: String,
        #[source]
        source: BackendFault,
    },
    #[error("publish to topic `{0}` cancelled before acknowledgment")]
    Cancelled(String),
}

/// Publishes topic messages through a [`PubSubBackend`].
///
/// Cheap to clone; the backend client and retry policy are shared across
/// invocations and carry no per-invocation state.
#[derive(Clone)]
pub struct PublishService {
    backend: Arc<dyn PubSubBackend>,
    retry: RetryPolicy,
}

impl PublishService {
    pub fn new(backend: Arc<dyn PubSubBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Confirm the destination topic exists before any dispatch.
    ///
    /// Not covered by the retry policy: a communication fault here fails
    /// the invocation on first error.
    pub async fn validate_topic(&self, topic_id: &str) -> Result<(), PublishError> {
        let exists =
            self.backend
                .topic_exists(topic_id)
                .await
                .map_err(|source| PublishError::Backend {
                    topic_id: topic_id.to_string(),
                    source,
                })?;

        if !exists {
            return Err(PublishError::TopicNotFound(topic_id.to_string()));
        }

        Ok(())
    }

    /// Serialize a topic message into a delivery envelope with the fixed
    /// provenance attributes.
    fn create_envelope(msg: &TopicMessageData) -> Result<DeliveryEnvelope, PublishError> {
        let data = Bytes::from(serde_json::to_vec(msg)?);
        let attributes = HashMap::from([
            (ATTR_ORIGIN.0.to_string(), ATTR_ORIGIN.1.to_string()),
            (ATTR_PUBLISHER.0.to_string(), ATTR_PUBLISHER.1.to_string()),
        ]);
        Ok(DeliveryEnvelope { data, attributes })
    }

    /// Publish one message to `topic_id` and return the backend-assigned
    /// delivery identifier.
    ///
    /// Dispatch faults in a retryable class are retried under the policy
    /// until acknowledged or until `cancel` fires; all other failures are
    /// terminal on first occurrence.
    pub async fn publish(
        &self,
        cancel: &CancellationToken,
        topic_id: &str,
        msg: TopicMessageData,
    ) -> Result<String, PublishError> {
        info!(
            topic_id,
            bucket = %msg.bucket,
            file = %msg.filename,
            "attempting to publish message"
        );

        self.validate_topic(topic_id).await?;
        let envelope = Self::create_envelope(&msg)?;

        if cancel.is_cancelled() {
            return Err(PublishError::Cancelled(topic_id.to_string()));
        }

        let mut retries: u32 = 0;
        loop {
            // Cancellation must win both while awaiting the backend's
            // acknowledgment and while backing off between attempts.
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(PublishError::Cancelled(topic_id.to_string()));
                }
                res = self.backend.publish(topic_id, &envelope) => res,
            };
            match attempt {
                Ok(delivery_id) => return Ok(delivery_id),
                Err(fault) if self.retry.is_retryable(fault.class) => {
                    let delay = self.retry.backoff_for(retries);
                    retries += 1;
                    warn!(
                        topic_id,
                        attempt = retries,
                        backoff_ms = delay.as_millis() as u64,
                        error = %fault,
                        "dispatch failed, backing off before retry"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(PublishError::Cancelled(topic_id.to_string()));
                        }
                        _ = sleep(delay) => {}
                    }
                }
                Err(fault) => {
                    return Err(PublishError::Publish {
                        topic_id: topic_id.to_string(),
                        source: fault,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::retry::FaultClass;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend double: fails the first `fail_first` dispatches with
    /// `fail_class`, then succeeds. Call counts expose which pipeline
    /// steps actually ran.
    struct MockBackend {
        topic_present: bool,
        exists_fault: Option<FaultClass>,
        fail_first: usize,
        fail_class: FaultClass,
        exists_calls: AtomicUsize,
        publish_calls: AtomicUsize,
    }

    impl MockBackend {
        fn healthy() -> Self {
            Self {
                topic_present: true,
                exists_fault: None,
                fail_first: 0,
                fail_class: FaultClass::Unavailable,
                exists_calls: AtomicUsize::new(0),
                publish_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PubSubBackend for MockBackend {
        async fn topic_exists(&self, _topic_id: &str) -> Result<bool, BackendFault> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            match self.exists_fault {
                Some(class) => Err(BackendFault::new(class, "lookup failed")),
                None => Ok(self.topic_present),
            }
        }

        async fn publish(
            &self,
            _topic_id: &str,
            _envelope: &DeliveryEnvelope,
        ) -> Result<String, BackendFault> {
            let attempt = self.publish_calls.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                Err(BackendFault::new(self.fail_class, "dispatch failed"))
            } else {
                Ok("delivery-1".to_string())
            }
        }
    }

    /// Backend double whose dispatch never acknowledges: the publish
    /// future stays pending forever after counting the attempt.
    #[derive(Default)]
    struct StalledBackend {
        publish_calls: AtomicUsize,
    }

    #[async_trait]
    impl PubSubBackend for StalledBackend {
        async fn topic_exists(&self, _topic_id: &str) -> Result<bool, BackendFault> {
            Ok(true)
        }

        async fn publish(
            &self,
            _topic_id: &str,
            _envelope: &DeliveryEnvelope,
        ) -> Result<String, BackendFault> {
            self.publish_calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn service(backend: Arc<MockBackend>) -> PublishService {
        PublishService::new(backend, RetryPolicy::default())
    }

    fn message() -> TopicMessageData {
        TopicMessageData {
            bucket: "media-bucket".into(),
            filename: "clip1.mp4".into(),
            filepath: "gs://media-bucket/clip1.mp4".into(),
            content_type: "video/mp4".into(),
            size: "1024".into(),
            time_created: None,
        }
    }

    #[tokio::test]
    async fn missing_topic_fails_without_dispatch() {
        let backend = Arc::new(MockBackend {
            topic_present: false,
            ..MockBackend::healthy()
        });
        let err = service(backend.clone())
            .publish(&CancellationToken::new(), "missing-topic", message())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::TopicNotFound(topic) if topic == "missing-topic"));
        assert_eq!(backend.publish_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exists_check_fault_fails_fast() {
        let backend = Arc::new(MockBackend {
            exists_fault: Some(FaultClass::Unavailable),
            ..MockBackend::healthy()
        });
        let err = service(backend.clone())
            .publish(&CancellationToken::new(), "events", message())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Backend { .. }));
        assert_eq!(backend.exists_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.publish_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_faults_are_retried_until_acknowledged() {
        let backend = Arc::new(MockBackend {
            fail_first: 3,
            fail_class: FaultClass::Unavailable,
            ..MockBackend::healthy()
        });
        let id = service(backend.clone())
            .publish(&CancellationToken::new(), "events", message())
            .await
            .unwrap();

        assert_eq!(id, "delivery-1");
        assert_eq!(backend.publish_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn terminal_fault_makes_exactly_one_attempt() {
        let backend = Arc::new(MockBackend {
            fail_first: usize::MAX,
            fail_class: FaultClass::PermissionDenied,
            ..MockBackend::healthy()
        });
        let err = service(backend.clone())
            .publish(&CancellationToken::new(), "events", message())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Publish { .. }));
        assert_eq!(backend.publish_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_cancelled_scope_skips_dispatch() {
        let backend = Arc::new(MockBackend::healthy());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service(backend.clone())
            .publish(&cancel, "events", message())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Cancelled(_)));
        assert_eq!(backend.publish_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_mid_backoff_returns_promptly() {
        let backend = Arc::new(MockBackend {
            fail_first: usize::MAX,
            fail_class: FaultClass::Unavailable,
            ..MockBackend::healthy()
        });
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(600)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let err = service(backend.clone())
            .publish(&cancel, "events", message())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Cancelled(_)));
        // Returned at the cancellation instant, not after draining the
        // pending backoff.
        assert!(started.elapsed() <= Duration::from_millis(700));
        assert!(backend.publish_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_dispatch_await_returns_promptly() {
        let backend = Arc::new(StalledBackend::default());
        let publisher = PublishService::new(backend.clone(), RetryPolicy::default());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let err = publisher
            .publish(&cancel, "events", message())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Cancelled(_)));
        // Returned at the cancellation instant, not after the stalled
        // attempt resolved.
        assert!(started.elapsed() <= Duration::from_millis(100));
        assert_eq!(backend.publish_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn envelope_carries_payload_and_fixed_provenance() {
        let envelope = PublishService::create_envelope(&message()).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&envelope.data).unwrap();
        assert_eq!(body["bucket"], "media-bucket");
        assert_eq!(body["filename"], "clip1.mp4");
        assert_eq!(body["filepath"], "gs://media-bucket/clip1.mp4");
        assert_eq!(body["contenttype"], "video/mp4");
        assert_eq!(body["size"], "1024");

        assert_eq!(
            envelope.attributes.get("origin").map(String::as_str),
            Some("object-storage-event")
        );
        assert_eq!(
            envelope.attributes.get("publisher").map(String::as_str),
            Some("metadata-relay")
        );
    }
}
