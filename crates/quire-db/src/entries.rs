//! Entry repository implementation.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use quire_core::{
    normalize_tags, CreateEntryRequest, Entry, EntryRepository, Error, ListEntriesRequest, Result,
    SearchEntriesRequest, Tag,
};

use crate::escape_like;
use crate::gateway::Gateway;

/// Columns selected for every entry read, aliased on `entries e`.
const ENTRY_COLUMNS: &str =
    "e.id, e.title, e.content, e.type, e.created_at, e.updated_at, e.created_by";

/// Newest first. Rows without a timestamp sort last; `id` keeps ties stable.
const NEWEST_FIRST: &str = "ORDER BY e.created_at DESC NULLS LAST, e.id";

/// PostgreSQL implementation of EntryRepository.
#[derive(Debug, Clone)]
pub struct PgEntryRepository {
    gateway: Gateway,
}

impl PgEntryRepository {
    /// Create a new PgEntryRepository on top of the given gateway.
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

// =============================================================================
// QUERY BUILDING
// =============================================================================

fn validate_create(req: &CreateEntryRequest) -> Result<()> {
    if req.title.trim().is_empty() {
        return Err(Error::InvalidInput("title cannot be empty".to_string()));
    }
    if req.entry_type.trim().is_empty() {
        return Err(Error::InvalidInput("entry type cannot be empty".to_string()));
    }
    Ok(())
}

/// Build the filtered list query.
///
/// Returns the SQL and its text parameters in bind order. The limit is the
/// final placeholder and is bound separately.
fn build_list_query(req: &ListEntriesRequest) -> (String, Vec<String>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();
    let mut param_idx = 1;

    if let Some(tag) = &req.tag {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM entry_tags et JOIN tags t ON t.id = et.tag_id \
             WHERE et.entry_id = e.id AND t.name = ${})",
            param_idx
        ));
        params.push(tag.clone());
        param_idx += 1;
    }

    if let Some(entry_type) = &req.entry_type {
        conditions.push(format!("e.type = ${}", param_idx));
        params.push(entry_type.clone());
        param_idx += 1;
    }

    let mut query = format!("SELECT {} FROM entries e", ENTRY_COLUMNS);
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    query.push_str(&format!(" {} LIMIT ${}", NEWEST_FIRST, param_idx));

    (query, params)
}

/// Build the search query and its single `ILIKE` pattern.
///
/// Without `literal`, `%` and `_` in the user's query keep their wildcard
/// meaning.
fn build_search_query(req: &SearchEntriesRequest) -> Result<(String, String)> {
    let mut conditions = Vec::new();
    if req.in_title {
        conditions.push("e.title ILIKE $1");
    }
    if req.in_content {
        conditions.push("e.content ILIKE $1");
    }
    if conditions.is_empty() {
        return Err(Error::InvalidInput(
            "search must include title or content".to_string(),
        ));
    }

    let needle = if req.literal {
        escape_like(&req.query)
    } else {
        req.query.clone()
    };

    let query = format!(
        "SELECT {} FROM entries e WHERE {} {}",
        ENTRY_COLUMNS,
        conditions.join(" OR "),
        NEWEST_FIRST
    );
    Ok((query, format!("%{}%", needle)))
}

fn entry_from_row(row: &PgRow) -> Result<Entry> {
    Ok(Entry {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        entry_type: row.try_get::<Option<String>, _>("type")?.unwrap_or_default(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        created_by: row
            .try_get::<Option<String>, _>("created_by")?
            .unwrap_or_default(),
        tags: Vec::new(),
    })
}

// =============================================================================
// CONNECTION-LEVEL HELPERS
// =============================================================================

/// Resolve a tag name to its id, inserting it when absent.
async fn upsert_tag(conn: &mut PgConnection, name: &str) -> Result<Uuid> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        "INSERT INTO tags (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = inserted {
        return Ok(id);
    }

    // Tag already exists
    let id: Uuid = sqlx::query_scalar("SELECT id FROM tags WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn link_tag(conn: &mut PgConnection, entry_id: Uuid, tag_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO entry_tags (entry_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(entry_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Fill in the current tag set of every entry with one batched query.
async fn attach_tags(conn: &mut PgConnection, entries: &mut [Entry]) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
    let rows = sqlx::query(
        "SELECT et.entry_id, t.name
         FROM entry_tags et
         JOIN tags t ON t.id = et.tag_id
         WHERE et.entry_id = ANY($1)
         ORDER BY t.name",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_entry: HashMap<Uuid, Vec<String>> = HashMap::new();
    for row in rows {
        let entry_id: Uuid = row.try_get("entry_id")?;
        by_entry.entry(entry_id).or_default().push(row.try_get("name")?);
    }

    for entry in entries.iter_mut() {
        entry.tags = by_entry.remove(&entry.id).unwrap_or_default();
    }
    Ok(())
}

async fn fetch_entries(
    conn: &mut PgConnection,
    query: &str,
    params: &[String],
    limit: Option<i64>,
) -> Result<Vec<Entry>> {
    let mut q = sqlx::query(query);
    for param in params {
        q = q.bind(param);
    }
    if let Some(limit) = limit {
        q = q.bind(limit);
    }

    let rows = q.fetch_all(&mut *conn).await?;
    let mut entries = rows.iter().map(entry_from_row).collect::<Result<Vec<_>>>()?;
    attach_tags(conn, &mut entries).await?;
    Ok(entries)
}

// =============================================================================
// REPOSITORY
// =============================================================================

#[async_trait]
impl EntryRepository for PgEntryRepository {
    async fn create(&self, req: CreateEntryRequest) -> Result<Uuid> {
        validate_create(&req)?;

        let start = Instant::now();
        let tags = normalize_tags(&req.tags);
        let tag_count = tags.len();

        let entry_id = self
            .gateway
            .transaction(move |conn| {
                Box::pin(async move {
                    let entry_id: Uuid = sqlx::query_scalar(
                        "INSERT INTO entries (title, content, type, created_by)
                         VALUES ($1, $2, $3, $4)
                         RETURNING id",
                    )
                    .bind(&req.title)
                    .bind(&req.content)
                    .bind(&req.entry_type)
                    .bind(&req.created_by)
                    .fetch_one(&mut *conn)
                    .await?;

                    for name in &tags {
                        let tag_id = upsert_tag(&mut *conn, name).await?;
                        link_tag(&mut *conn, entry_id, tag_id).await?;
                    }

                    Ok(entry_id)
                })
            })
            .await?;

        info!(
            subsystem = "database",
            component = "entries",
            op = "create",
            entry_id = %entry_id,
            tag_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Entry created"
        );
        Ok(entry_id)
    }

    async fn list(&self, req: ListEntriesRequest) -> Result<Vec<Entry>> {
        if req.limit < 1 {
            return Err(Error::InvalidInput(format!(
                "limit must be at least 1, got {}",
                req.limit
            )));
        }

        let start = Instant::now();
        let (query, params) = build_list_query(&req);
        debug!(
            subsystem = "database",
            component = "entries",
            op = "list",
            tag = req.tag.as_deref(),
            entry_type = req.entry_type.as_deref(),
            limit = req.limit,
            "Listing entries"
        );

        let limit = req.limit;
        let entries = self
            .gateway
            .with_connection(move |conn| {
                Box::pin(async move { fetch_entries(conn, &query, &params, Some(limit)).await })
            })
            .await?;

        debug!(
            subsystem = "database",
            component = "entries",
            op = "list",
            result_count = entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Entries listed"
        );
        Ok(entries)
    }

    async fn search(&self, req: SearchEntriesRequest) -> Result<Vec<Entry>> {
        // Rejected before a connection is acquired.
        let (query, pattern) = build_search_query(&req)?;

        let start = Instant::now();
        let entries = self
            .gateway
            .with_connection(move |conn| {
                Box::pin(async move { fetch_entries(conn, &query, &[pattern], None).await })
            })
            .await?;

        debug!(
            subsystem = "database",
            component = "entries",
            op = "search",
            query = %req.query,
            in_title = req.in_title,
            in_content = req.in_content,
            literal = req.literal,
            result_count = entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search completed"
        );
        Ok(entries)
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Entry>> {
        let query = format!(
            "SELECT {} FROM entries e WHERE e.title ILIKE $1 {} LIMIT 1",
            ENTRY_COLUMNS, NEWEST_FIRST
        );
        let pattern = format!("%{}%", title);

        let mut entries = self
            .gateway
            .with_connection(move |conn| {
                Box::pin(async move { fetch_entries(conn, &query, &[pattern], None).await })
            })
            .await?;

        debug!(
            subsystem = "database",
            component = "entries",
            op = "get_by_title",
            title = %title,
            found = !entries.is_empty(),
            "Entry lookup by title"
        );
        Ok(entries.pop())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = self
            .gateway
            .with_connection(|conn| {
                Box::pin(async move {
                    let rows = sqlx::query(
                        r#"
                        SELECT t.id, t.name, COUNT(et.entry_id) AS usage_count
                        FROM tags t
                        LEFT JOIN entry_tags et ON et.tag_id = t.id
                        GROUP BY t.id, t.name
                        ORDER BY usage_count DESC, t.name ASC
                        "#,
                    )
                    .fetch_all(&mut *conn)
                    .await?;

                    rows.iter()
                        .map(|row| -> Result<Tag> {
                            Ok(Tag {
                                id: row.try_get("id")?,
                                name: row.try_get("name")?,
                                usage_count: row.try_get("usage_count")?,
                            })
                        })
                        .collect::<Result<Vec<_>>>()
                })
            })
            .await?;

        debug!(
            subsystem = "database",
            component = "entries",
            op = "list_tags",
            result_count = tags.len(),
            "Tags listed"
        );
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_without_filters() {
        let (sql, params) = build_list_query(&ListEntriesRequest::default());
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY e.created_at DESC NULLS LAST, e.id LIMIT $1"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_list_query_with_tag_filter() {
        let req = ListEntriesRequest {
            tag: Some("rust".to_string()),
            ..Default::default()
        };
        let (sql, params) = build_list_query(&req);
        assert!(sql.contains("t.name = $1"));
        assert!(sql.contains("LIMIT $2"));
        assert_eq!(params, vec!["rust".to_string()]);
    }

    #[test]
    fn test_list_query_combines_filters_with_and() {
        let req = ListEntriesRequest {
            tag: Some("rust".to_string()),
            entry_type: Some("idea".to_string()),
            limit: 5,
        };
        let (sql, params) = build_list_query(&req);
        assert!(sql.contains("t.name = $1) AND e.type = $2"));
        assert!(sql.contains("LIMIT $3"));
        assert_eq!(params, vec!["rust".to_string(), "idea".to_string()]);
    }

    #[test]
    fn test_list_query_type_only() {
        let req = ListEntriesRequest {
            entry_type: Some("research".to_string()),
            ..Default::default()
        };
        let (sql, params) = build_list_query(&req);
        assert!(sql.contains("WHERE e.type = $1"));
        assert!(!sql.contains("entry_tags"));
        assert_eq!(params, vec!["research".to_string()]);
    }

    #[test]
    fn test_search_query_both_fields() {
        let (sql, pattern) = build_search_query(&SearchEntriesRequest::new("foo")).unwrap();
        assert!(sql.contains("e.title ILIKE $1 OR e.content ILIKE $1"));
        assert!(!sql.contains("LIMIT"));
        assert_eq!(pattern, "%foo%");
    }

    #[test]
    fn test_search_query_title_only() {
        let req = SearchEntriesRequest {
            in_content: false,
            ..SearchEntriesRequest::new("foo")
        };
        let (sql, _) = build_search_query(&req).unwrap();
        assert!(sql.contains("WHERE e.title ILIKE $1 ORDER BY"));
        assert!(!sql.contains("e.content ILIKE"));
    }

    #[test]
    fn test_search_in_neither_field_is_rejected() {
        let req = SearchEntriesRequest {
            in_title: false,
            in_content: false,
            ..SearchEntriesRequest::new("foo")
        };
        let err = build_search_query(&req).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_search_pattern_keeps_wildcards_by_default() {
        let (_, pattern) = build_search_query(&SearchEntriesRequest::new("50%_off")).unwrap();
        assert_eq!(pattern, "%50%_off%");
    }

    #[test]
    fn test_search_pattern_literal_escapes_wildcards() {
        let req = SearchEntriesRequest {
            literal: true,
            ..SearchEntriesRequest::new("50%_off")
        };
        let (_, pattern) = build_search_query(&req).unwrap();
        assert_eq!(pattern, "%50\\%\\_off%");
    }

    #[test]
    fn test_validate_create_rejects_blank_title() {
        let req = CreateEntryRequest::new("   ", "content");
        assert!(matches!(validate_create(&req), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_create_rejects_blank_type() {
        let req = CreateEntryRequest::new("Title", "content").entry_type("");
        assert!(matches!(validate_create(&req), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_create_allows_empty_content() {
        let req = CreateEntryRequest::new("Title", "");
        assert!(validate_create(&req).is_ok());
    }
}
