//! Content documents and the sources they are resolved from.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use notecard_core::content::{AuthorBadge, Avatar};
use notecard_core::scorecard::ScorecardModel;
use serde::{Deserialize, Serialize};

/// Who published a piece of content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    /// Stable public identifier; moderation matches on it.
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `http(s)` URL or a `data:<mime>;base64,<payload>` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl AuthorRecord {
    /// The name, or a shortened id when the author never set one.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        let chars: Vec<char> = self.id.chars().collect();
        if chars.len() <= 15 {
            return self.id.clone();
        }
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{head}…{tail}")
    }

    pub fn avatar(&self) -> Option<Avatar> {
        let picture = self.picture.as_deref()?.trim();
        if picture.is_empty() {
            return None;
        }
        if let Some(data) = picture.strip_prefix("data:") {
            let (_, payload) = data.split_once(";base64,")?;
            return STANDARD.decode(payload).ok().map(Avatar::Inline);
        }
        Some(Avatar::Remote(picture.to_string()))
    }
}

/// What kind of card a document renders to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentBody {
    Note { content: String },
    Scorecard {
        #[serde(default)]
        scorecard: ScorecardModel,
    },
}

/// A resolved piece of content, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub author: AuthorRecord,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(flatten)]
    pub body: ContentBody,
}

impl ContentDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parse content document")
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_at, 0).unwrap_or_default()
    }

    pub fn author_badge(&self) -> AuthorBadge {
        AuthorBadge {
            display_name: self.author.display_name(),
            avatar: self.author.avatar(),
            timestamp: self.timestamp(),
        }
    }
}

/// Resolves content references to documents.
pub trait ContentSource: Send + Sync {
    /// `Ok(None)` when nothing exists under `reference`.
    fn resolve(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Option<ContentDocument>>> + Send;
}

/// Reads `<dir>/<reference>.json`.
#[derive(Debug, Clone)]
pub struct FileContentSource {
    dir: PathBuf,
}

impl FileContentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// References are restricted so they can never escape the content directory.
pub fn is_valid_reference(reference: &str) -> bool {
    !reference.is_empty()
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl ContentSource for FileContentSource {
    async fn resolve(&self, reference: &str) -> Result<Option<ContentDocument>> {
        if !is_valid_reference(reference) {
            return Ok(None);
        }
        let path = self.dir.join(format!("{reference}.json"));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };
        ContentDocument::from_json(&raw)
            .with_context(|| format!("load {}", path.display()))
            .map(Some)
    }
}
