//! Publisher port: the external capability that delivers a post.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::PublishError;

/// Structured success result of a publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub http_status: u16,

    /// Provider-assigned id of the created post, when the response carries one.
    pub post_id: Option<String>,
}

/// Delivers one post. One operation, parameterized by nothing but the text;
/// retry counting and backoff live in the engine, not here.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError>;
}
