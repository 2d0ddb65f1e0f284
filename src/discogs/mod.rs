pub mod client;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use client::{DEFAULT_MAX_ATTEMPTS, DiscogsClient};

/// Releases are passed through exactly as Discogs returns them.
pub type Release = Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET /users/{username}/collection/folders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderList {
    #[serde(default)]
    pub folders: Vec<Folder>,
}

/// Server-reported shape of a paginated result set.
///
/// Unknown keys (Discogs also sends `urls`) are kept so the snapshot carries
/// the metadata verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pagination {
    pub fn total_pages(&self) -> u32 {
        self.pages.unwrap_or(1)
    }

    pub fn total_items(&self) -> u64 {
        self.items.unwrap_or(0)
    }
}

/// One page of `GET /users/{username}/collection/folders/{id}/releases`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionPage {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// The consolidated file written to `collection.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub pagination: Pagination,
    pub releases: Vec<Release>,
    pub last_updated: String,
}

impl CollectionSnapshot {
    pub fn new(pagination: Pagination, releases: Vec<Release>, at: DateTime<Utc>) -> Self {
        Self {
            pagination,
            releases,
            last_updated: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
