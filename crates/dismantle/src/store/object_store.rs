use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::errors::RetrievalError;
use crate::models::artifact::ArtifactIndexEntry;

/// An object body together with what the store knows about it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub body: Bytes,
}

/// Key/value blob storage holding the analysis artifacts
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every object under `prefix`, in whatever order the store returns them.
    async fn list(&self, prefix: &str) -> Result<Vec<ArtifactIndexEntry>, RetrievalError>;

    async fn get(&self, key: &str) -> Result<StoredObject, RetrievalError>;
}
