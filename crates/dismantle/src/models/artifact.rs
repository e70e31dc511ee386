use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RetrievalError;

/// Listing record used to populate history without fetching bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIndexEntry {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

impl ArtifactIndexEntry {
    pub fn new<S: Into<String>>(key: S, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }

    /// Last path segment of the key, e.g. `example.com.json`.
    pub fn display_name(&self) -> &str {
        display_name(&self.key)
    }
}

pub fn display_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub image_count: u64,
    pub paragraph_count: u64,
    #[serde(default)]
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(default, rename = "alt")]
    pub alt_text: Option<String>,
}

impl MediaItem {
    /// Alt text, or a positional fallback when the page gave none.
    pub fn caption(&self, index: usize) -> String {
        match self.alt_text.as_deref() {
            Some(alt) if !alt.trim().is_empty() => alt.to_string(),
            _ => format!("Image {}", index + 1),
        }
    }
}

/// A block of the scraped page, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Header {
        #[serde(default)]
        level: String,
        #[serde(default)]
        text: String,
    },
    Paragraph {
        #[serde(default)]
        text: String,
    },
    List {
        #[serde(default)]
        items: Vec<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    /// Numeric depth of a header block (`"h2"` is 2), clamped to 1..=6.
    pub fn header_depth(&self) -> Option<u8> {
        match self {
            ContentBlock::Header { level, .. } => Some(
                level
                    .trim()
                    .trim_start_matches(&['h', 'H'][..])
                    .parse::<u8>()
                    .unwrap_or(1)
                    .clamp(1, 6),
            ),
            _ => None,
        }
    }
}

/// A stored website analysis. Read-only from this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Store key, or the URL the artifact was fetched from.
    #[serde(skip)]
    pub key: String,
    #[serde(skip)]
    pub last_modified: Option<DateTime<Utc>>,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub metadata: ArtifactMetadata,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub structured_content: Vec<ContentBlock>,
}

impl Artifact {
    /// Decode a stored body. Either the whole artifact parses or an error is returned.
    pub fn from_json(
        key: &str,
        last_modified: Option<DateTime<Utc>>,
        body: &[u8],
    ) -> Result<Self, RetrievalError> {
        let text = std::str::from_utf8(body).map_err(|_| RetrievalError::Decode {
            key: key.to_string(),
        })?;
        let mut artifact: Artifact =
            serde_json::from_str(text).map_err(|e| RetrievalError::Parse {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        artifact.key = key.to_string();
        artifact.last_modified = last_modified;
        Ok(artifact)
    }

    pub fn header_count(&self) -> usize {
        self.metadata.headers.len()
    }

    /// Date part of the producer's timestamp.
    pub fn analysis_date(&self) -> Option<&str> {
        self.timestamp
            .as_deref()
            .map(|ts| ts.get(..10).unwrap_or(ts))
    }

    pub fn media_urls(&self) -> Vec<&str> {
        self.media.iter().map(|m| m.url.as_str()).collect()
    }

    /// Media URLs as an indented JSON array, the format of the media list download.
    pub fn media_list_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.media_urls())
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_ARTIFACT_JSON: &str = r#"{
    "url": "https://www.example.com",
    "title": "Example Domain",
    "timestamp": "2024-11-05T10:22:31.123456",
    "metadata": {"image_count": 2, "paragraph_count": 3, "headers": ["Welcome", "About"]},
    "media": [
        {"url": "https://www.example.com/a.png", "alt": "Team photo"},
        {"url": "https://www.example.com/b.png", "alt": ""}
    ],
    "structured_content": [
        {"type": "header", "level": "h2", "text": "Welcome"},
        {"type": "paragraph", "text": "Hello there."},
        {"type": "table", "rows": [[1, 2]]},
        {"type": "list", "items": ["one", "two"]}
    ]
}"#;
