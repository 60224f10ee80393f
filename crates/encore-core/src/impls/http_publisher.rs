//! HTTP publisher: delivers a post to the provider's REST endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::{CredentialError, PublishError};
use crate::ports::{CredentialProvider, PublishReceipt, Publisher};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct PostRequest<'a> {
    text: &'a str,
}

/// Bearer-token publisher against a post-creation endpoint.
///
/// Credentials come from the injected provider on every call, so a token
/// refreshed by the external authorization flow is picked up immediately.
/// An unauthenticated provider short-circuits to `AuthRequired` before any
/// network traffic.
pub struct HttpPublisher {
    client: Client,
    endpoint: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpPublisher {
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.into(),
            credentials,
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError> {
        let token = self.credentials.access_token().map_err(|e| match e {
            CredentialError::Unauthenticated => PublishError::AuthRequired,
            CredentialError::Backend(msg) => PublishError::Transport(msg),
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&PostRequest { text })
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PublishError::Transport(format!("response decode: {e}")))?;

        // The create endpoint answers 201 with the new post under `data`.
        if status == 201 {
            let post_id = body
                .pointer("/data/id")
                .and_then(|v| v.as_str())
                .map(String::from);
            Ok(PublishReceipt {
                http_status: status,
                post_id,
            })
        } else {
            Err(PublishError::from_http(status, error_detail(status, &body)))
        }
    }
}

/// Diagnostic text for an error response: the first structured error's
/// `message` (or `title`), else the body's `detail`, else a fallback keyed
/// by HTTP status.
fn error_detail(status: u16, body: &serde_json::Value) -> String {
    if let Some(first) = body
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|a| a.first())
    {
        if let Some(message) = first
            .get("message")
            .or_else(|| first.get("title"))
            .and_then(|v| v.as_str())
        {
            return message.to_string();
        }
    }

    if let Some(detail) = body.get("detail").and_then(|v| v.as_str()) {
        return detail.to_string();
    }

    fallback_detail(status)
}

fn fallback_detail(status: u16) -> String {
    match status {
        400 => "bad request".to_string(),
        401 => "authentication required".to_string(),
        403 => "forbidden".to_string(),
        429 => "rate limited".to_string(),
        500..=599 => format!("upstream server error (HTTP {status})"),
        _ => format!("unknown error (HTTP {status})"),
    }
}
