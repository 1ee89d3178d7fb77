//! Repository interfaces.
//!
//! The CLI depends only on these traits; `quire-db` supplies the PostgreSQL
//! implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// ENTRY REPOSITORY
// =============================================================================

/// Repository for entries and their tags.
///
/// Every call acquires its own connection and releases it before returning.
/// `create` is the only mutating operation.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Insert an entry together with its tags in one transaction.
    async fn create(&self, req: CreateEntryRequest) -> Result<Uuid>;

    /// List entries newest first, optionally filtered by tag and/or type.
    async fn list(&self, req: ListEntriesRequest) -> Result<Vec<Entry>>;

    /// Case-insensitive substring search over title and/or content.
    async fn search(&self, req: SearchEntriesRequest) -> Result<Vec<Entry>>;

    /// First entry whose title contains `title` (case-insensitive).
    async fn get_by_title(&self, title: &str) -> Result<Option<Entry>>;

    /// All tags with usage counts, most used first.
    async fn list_tags(&self) -> Result<Vec<Tag>>;
}
