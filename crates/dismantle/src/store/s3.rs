use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::object_store::{ObjectStore, StoredObject};
use crate::aws::credentials::Credentials;
use crate::aws::sigv4::{sign_request, uri_encode, SigningParams};
use crate::errors::RetrievalError;
use crate::models::artifact::ArtifactIndexEntry;

const SIGNING_SERVICE: &str = "s3";

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Path-style endpoint such as a local MinIO; virtual-hosted AWS when unset.
    pub endpoint: Option<String>,
    pub credentials: Credentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
    #[serde(default)]
    contents: Vec<ListedObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedObject {
    key: String,
    last_modified: DateTime<Utc>,
}

/// S3 over its REST API: ListObjectsV2 and GetObject.
pub struct S3Store {
    client: Client,
    config: S3Config,
}

impl S3Store {
    pub fn new(config: S3Config) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self { client, config })
    }

    fn bucket_url(&self) -> String {
        match &self.config.endpoint {
            Some(endpoint) => format!(
                "{}/{}",
                endpoint.trim_end_matches('/'),
                uri_encode(&self.config.bucket, true)
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                self.config.bucket, self.config.region
            ),
        }
    }

    fn list_url(&self, prefix: &str, token: Option<&str>) -> Result<Url, RetrievalError> {
        let mut query = format!("list-type=2&prefix={}", uri_encode(prefix, true));
        if let Some(token) = token {
            query.push_str(&format!("&continuation-token={}", uri_encode(token, true)));
        }
        parse_url(&format!("{}?{}", self.bucket_url(), query))
    }

    /// URL parsing folds `.` and `..` segments (encoded or not), which would
    /// address a different object, so such keys are refused.
    fn object_url(&self, key: &str) -> Result<Url, RetrievalError> {
        if key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(RetrievalError::InvalidKey(key.to_string()));
        }
        parse_url(&format!("{}/{}", self.bucket_url(), uri_encode(key, false)))
    }

    async fn signed_get(&self, url: Url) -> Result<Response, RetrievalError> {
        let headers = sign_request(
            "GET",
            &url,
            &[],
            b"",
            &SigningParams {
                credentials: &self.config.credentials,
                region: &self.config.region,
                service: SIGNING_SERVICE,
                time: Utc::now(),
                sign_content_sha256: true,
            },
        )?;

        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        Ok(builder.send().await?)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str) -> Result<Vec<ArtifactIndexEntry>, RetrievalError> {
        let mut entries = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let url = self.list_url(prefix, token.as_deref())?;
            let response = self.signed_get(url).await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(RetrievalError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let page: ListBucketResult = quick_xml::de::from_str(&body)
                .map_err(|e| RetrievalError::Listing(e.to_string()))?;
            debug!(
                bucket = %self.config.bucket,
                prefix,
                count = page.contents.len(),
                "listed objects"
            );
            entries.extend(
                page.contents
                    .into_iter()
                    .map(|object| ArtifactIndexEntry::new(object.key, object.last_modified)),
            );

            match page.next_continuation_token {
                Some(next) if page.is_truncated => token = Some(next),
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn get(&self, key: &str) -> Result<StoredObject, RetrievalError> {
        let response = self.signed_get(self.object_url(key)?).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RetrievalError::NotFound(key.to_string()));
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

        Ok(StoredObject {
            key: key.to_string(),
            last_modified,
            body: response.bytes().await?,
        })
    }
}

fn parse_url(url: &str) -> Result<Url, RetrievalError> {
    Url::parse(url).map_err(|e| RetrievalError::Transport(format!("Invalid store URL {}: {}", url, e)))
}
