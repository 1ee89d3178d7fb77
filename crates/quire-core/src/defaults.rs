//! Shared default values for quire.
//!
//! Crates reference these constants instead of repeating literals.

// =============================================================================
// ENTRIES
// =============================================================================

/// Entry type assigned when the caller does not provide one.
pub const ENTRY_TYPE: &str = "note";

/// Author recorded when the caller does not provide one.
pub const CREATED_BY: &str = "user";

/// Default page size for `list-entries`.
pub const LIST_LIMIT: i64 = 20;

// =============================================================================
// RENDERING
// =============================================================================

/// Maximum characters of content shown in list/search previews.
pub const PREVIEW_CHARS: usize = 100;

// =============================================================================
// DATABASE
// =============================================================================

/// Prepared statement cache size per connection (sqlx default).
pub const STATEMENT_CACHE_CAPACITY: usize = 100;
