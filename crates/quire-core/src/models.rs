//! Entry and tag records plus the request types the repository accepts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

/// A stored note, idea, or research item.
///
/// `tags` reflects the association table at fetch time and is never cached
/// beyond a single read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub entry_type: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub created_by: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A tag definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    /// Number of entries referencing this tag (computed)
    #[serde(default)]
    pub usage_count: i64,
}

/// Request for creating a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEntryRequest {
    pub title: String,
    pub content: String,
    pub entry_type: String,
    pub created_by: String,
    /// Raw tag names; trimmed and deduplicated on insert.
    pub tags: Vec<String>,
}

impl CreateEntryRequest {
    /// Create a request with the default type and author and no tags.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            entry_type: defaults::ENTRY_TYPE.to_string(),
            created_by: defaults::CREATED_BY.to_string(),
            tags: Vec::new(),
        }
    }

    pub fn entry_type(mut self, entry_type: impl Into<String>) -> Self {
        self.entry_type = entry_type.into();
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Request for listing entries.
///
/// Filters combine with AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntriesRequest {
    /// Exact tag name the entry must carry
    pub tag: Option<String>,
    /// Exact entry type
    pub entry_type: Option<String>,
    /// Maximum results (newest first)
    pub limit: i64,
}

impl Default for ListEntriesRequest {
    fn default() -> Self {
        Self {
            tag: None,
            entry_type: None,
            limit: defaults::LIST_LIMIT,
        }
    }
}

/// Request for substring search over titles and/or content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntriesRequest {
    pub query: String,
    pub in_title: bool,
    pub in_content: bool,
    /// Treat `%` and `_` in `query` as literal characters instead of
    /// pattern wildcards.
    pub literal: bool,
}

impl SearchEntriesRequest {
    /// Search both title and content, with wildcards left active.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            in_title: true,
            in_content: true,
            literal: false,
        }
    }
}
