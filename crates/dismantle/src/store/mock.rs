use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::object_store::{ObjectStore, StoredObject};
use crate::errors::RetrievalError;
use crate::models::artifact::ArtifactIndexEntry;

/// In-memory store for tests
#[derive(Default)]
pub struct MockObjectStore {
    objects: HashMap<String, (DateTime<Utc>, Bytes)>,
    unreachable: bool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails as if the network were down.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_object(mut self, key: &str, last_modified: DateTime<Utc>, body: &[u8]) -> Self {
        self.objects.insert(
            key.to_string(),
            (last_modified, Bytes::copy_from_slice(body)),
        );
        self
    }

    fn check_reachable(&self) -> Result<(), RetrievalError> {
        if self.unreachable {
            return Err(RetrievalError::Transport(
                "error trying to connect: connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ArtifactIndexEntry>, RetrievalError> {
        self.check_reachable()?;
        Ok(self
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (modified, _))| ArtifactIndexEntry::new(key.clone(), *modified))
            .collect())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, RetrievalError> {
        self.check_reachable()?;
        let (modified, body) = self
            .objects
            .get(key)
            .ok_or_else(|| RetrievalError::NotFound(key.to_string()))?;
        Ok(StoredObject {
            key: key.to_string(),
            last_modified: Some(*modified),
            body: body.clone(),
        })
    }
}
