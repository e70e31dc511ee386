use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::object_store::ObjectStore;
use crate::errors::RetrievalError;
use crate::models::artifact::{Artifact, ArtifactIndexEntry};

/// Where the scraper writes its analyses.
pub const DEFAULT_ARTIFACT_PREFIX: &str = "scraped-data/";

/// Lists and loads analysis artifacts. Never writes.
pub struct ArtifactStore {
    store: Box<dyn ObjectStore>,
    http: Client,
}

impl ArtifactStore {
    pub fn new(store: Box<dyn ObjectStore>) -> Result<Self, RetrievalError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self { store, http })
    }

    /// Index entries under `prefix`, newest first.
    pub async fn try_list_artifacts(
        &self,
        prefix: &str,
    ) -> Result<Vec<ArtifactIndexEntry>, RetrievalError> {
        let mut entries = self.store.list(prefix).await?;
        entries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(entries)
    }

    /// Like [`Self::try_list_artifacts`], but an unreachable store reads as an empty history.
    pub async fn list_artifacts(&self, prefix: &str) -> Vec<ArtifactIndexEntry> {
        match self.try_list_artifacts(prefix).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(prefix, error = %e, "failed to list artifacts");
                Vec::new()
            }
        }
    }

    pub async fn get_artifact(&self, key: &str) -> Result<Artifact, RetrievalError> {
        let object = self.store.get(key).await?;
        debug!(key, bytes = object.body.len(), "fetched artifact");
        Artifact::from_json(&object.key, object.last_modified, &object.body)
    }

    /// Load an artifact from the link the agent hands back after an analysis.
    pub async fn fetch_linked(&self, url: &str) -> Result<Artifact, RetrievalError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RetrievalError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
            .map(|time| time.with_timezone(&Utc));
        let body = response.bytes().await?;
        Artifact::from_json(url, last_modified, &body)
    }
}
