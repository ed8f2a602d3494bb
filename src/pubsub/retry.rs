//! Dispatch retry policy.
//!
//! Applies only to the publish-dispatch step. Topic existence checks and
//! message encoding fail fast and are never retried here.

use std::fmt;
use std::time::Duration;

/// Classified backend fault, derived from the transport status of a
/// failed call. The retry policy decides per class whether a dispatch
/// attempt may be repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    Aborted,
    Cancelled,
    Internal,
    ResourceExhausted,
    Unknown,
    Unavailable,
    DeadlineExceeded,
    InvalidArgument,
    NotFound,
    PermissionDenied,
    FailedPrecondition,
}

impl FaultClass {
    /// Map an HTTP status from the backend to a fault class.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => FaultClass::InvalidArgument,
            401 | 403 => FaultClass::PermissionDenied,
            404 => FaultClass::NotFound,
            409 => FaultClass::Aborted,
            412 => FaultClass::FailedPrecondition,
            429 => FaultClass::ResourceExhausted,
            499 => FaultClass::Cancelled,
            500 => FaultClass::Internal,
            503 => FaultClass::Unavailable,
            504 => FaultClass::DeadlineExceeded,
            _ => FaultClass::Unknown,
        }
    }
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultClass::Aborted => "aborted",
            FaultClass::Cancelled => "cancelled",
            FaultClass::Internal => "internal",
            FaultClass::ResourceExhausted => "resource exhausted",
            FaultClass::Unknown => "unknown",
            FaultClass::Unavailable => "unavailable",
            FaultClass::DeadlineExceeded => "deadline exceeded",
            FaultClass::InvalidArgument => "invalid argument",
            FaultClass::NotFound => "not found",
            FaultClass::PermissionDenied => "permission denied",
            FaultClass::FailedPrecondition => "failed precondition",
        };
        f.write_str(name)
    }
}

/// Retry policy configuration for dispatch attempts.
///
/// Immutable after process start and shared by all invocations. There is
/// no maximum attempt count; retries stop only when the invocation's
/// cancellation scope fires.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_backoff: Duration,

    /// Upper bound on any single delay.
    pub max_backoff: Duration,

    /// Growth factor applied to each subsequent delay.
    pub multiplier: f64,

    /// Fault classes that may be retried.
    pub retryable: Vec<FaultClass>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(60),
            multiplier: 1.45,
            retryable: vec![
                FaultClass::Aborted,
                FaultClass::Cancelled,
                FaultClass::Internal,
                FaultClass::ResourceExhausted,
                FaultClass::Unknown,
                FaultClass::Unavailable,
                FaultClass::DeadlineExceeded,
            ],
        }
    }
}

impl RetryPolicy {
    /// Whether a fault of the given class may be retried.
    pub fn is_retryable(&self, class: FaultClass) -> bool {
        self.retryable.contains(&class)
    }

    /// Delay before retry number `retry` (0-based), capped at
    /// `max_backoff`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let grown = self.initial_backoff.mul_f64(self.multiplier.powi(retry as i32));
        grown.min(self.max_backoff)
    }
}
