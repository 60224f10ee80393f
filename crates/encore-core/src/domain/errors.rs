//! Error taxonomy for publishing and storage.

use thiserror::Error;

use super::task::TaskId;

/// Classified failure of a publish attempt.
///
/// The classification drives the engine's retry decision: retryable kinds go
/// through the backoff counter, non-retryable kinds fail the task directly.
/// Failures never escape the engine boundary; their display text is recorded
/// in the task's own `error_message` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// 401. Requires an external re-authorization flow; retrying without it
    /// cannot succeed, so the engine does not.
    #[error("authentication required; complete the authorization flow before retrying")]
    AuthRequired,

    /// 4xx other than 401/429. Counted toward the retry budget even though
    /// it is unlikely to self-resolve.
    #[error("request rejected (HTTP {status}): {detail}")]
    Client { status: u16, detail: String },

    /// 429.
    #[error("rate limited (HTTP 429): {detail}")]
    RateLimited { detail: String },

    /// 5xx.
    #[error("upstream server error (HTTP {status}): {detail}")]
    Server { status: u16, detail: String },

    /// Network or response-decode failure; no HTTP status available.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Validation failure: the task has nothing to publish. Reported without
    /// ever calling the publisher.
    #[error("post content is empty")]
    EmptyContent,
}

impl PublishError {
    /// Classify an HTTP error response by status code.
    pub fn from_http(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            401 => PublishError::AuthRequired,
            429 => PublishError::RateLimited { detail },
            500..=599 => PublishError::Server { status, detail },
            _ => PublishError::Client { status, detail },
        }
    }

    /// May another attempt with backoff succeed on its own?
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PublishError::AuthRequired | PublishError::EmptyContent)
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            PublishError::AuthRequired => Some(401),
            PublishError::Client { status, .. } | PublishError::Server { status, .. } => {
                Some(*status)
            }
            PublishError::RateLimited { .. } => Some(429),
            PublishError::Transport(_) | PublishError::EmptyContent => None,
        }
    }
}

/// Credential lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No usable token. Signaled distinctly so the operator can run the
    /// authorization flow instead of watching retries burn out.
    #[error("no valid credentials; complete the authorization flow first")]
    Unauthenticated,

    #[error("credential backend error: {0}")]
    Backend(String),
}

/// Store failure. Unlike publish failures these abort the running pass: the
/// store is the system's substrate, not a per-task hazard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::auth(401, true)]
    #[case::forbidden(403, false)]
    #[case::bad_request(400, false)]
    fn from_http_singles_out_authentication(#[case] status: u16, #[case] is_auth: bool) {
        let err = PublishError::from_http(status, "d");
        assert_eq!(matches!(err, PublishError::AuthRequired), is_auth);
    }

    #[rstest]
    #[case(429)]
    #[case(500)]
    #[case(503)]
    fn transient_statuses_are_retryable(#[case] status: u16) {
        assert!(PublishError::from_http(status, "d").is_retryable());
    }

    #[test]
    fn auth_and_empty_content_are_not_retryable() {
        assert!(!PublishError::AuthRequired.is_retryable());
        assert!(!PublishError::EmptyContent.is_retryable());
        assert!(PublishError::Transport("reset by peer".into()).is_retryable());
    }

    #[test]
    fn http_status_is_preserved() {
        assert_eq!(PublishError::from_http(502, "d").http_status(), Some(502));
        assert_eq!(PublishError::from_http(403, "d").http_status(), Some(403));
        assert_eq!(PublishError::Transport("x".into()).http_status(), None);
    }
}
