//! Content pool port: candidate link payloads for replacement tasks.

use async_trait::async_trait;

use crate::domain::StoreError;

/// Read-only ordered list of link payloads. Blank entries are tolerated here
/// and filtered by the consumer.
#[async_trait]
pub trait ContentPool: Send + Sync {
    async fn list_entries(&self) -> Result<Vec<String>, StoreError>;
}
