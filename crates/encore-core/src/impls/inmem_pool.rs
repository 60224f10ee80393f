//! Static content pool for development and tests.

use async_trait::async_trait;

use crate::domain::StoreError;
use crate::ports::ContentPool;

/// Fixed list of link payloads.
pub struct StaticContentPool {
    entries: Vec<String>,
}

impl StaticContentPool {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl ContentPool for StaticContentPool {
    async fn list_entries(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.clone())
    }
}
