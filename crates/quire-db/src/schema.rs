//! Idempotent schema for entries, tags, and their association.
//!
//! Every statement is `IF NOT EXISTS`, so applying the script to a populated
//! database changes nothing.

/// Tables touched by the schema script, in creation order.
pub const TABLES: [&str; 3] = ["entries", "tags", "entry_tags"];

/// Indexes created on `entries`.
pub const INDEXES: [&str; 4] = [
    "idx_entries_created_at",
    "idx_entries_type",
    "idx_entries_title",
    "idx_entries_content",
];

/// Full schema script.
pub const SCHEMA_SQL: &str = r#"
CREATE EXTENSION IF NOT EXISTS "uuid-ossp";

CREATE TABLE IF NOT EXISTS entries (
    id UUID PRIMARY KEY DEFAULT uuid_generate_v4(),
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    type TEXT DEFAULT 'note',
    created_at TIMESTAMP DEFAULT NOW(),
    updated_at TIMESTAMP DEFAULT NOW(),
    created_by TEXT
);

CREATE TABLE IF NOT EXISTS tags (
    id UUID PRIMARY KEY DEFAULT uuid_generate_v4(),
    name TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS entry_tags (
    entry_id UUID REFERENCES entries(id) ON DELETE CASCADE,
    tag_id UUID REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (entry_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_entries_created_at ON entries(created_at);
CREATE INDEX IF NOT EXISTS idx_entries_type ON entries(type);
CREATE INDEX IF NOT EXISTS idx_entries_title ON entries USING gin(to_tsvector('english', title));
CREATE INDEX IF NOT EXISTS idx_entries_content ON entries USING gin(to_tsvector('english', content));
"#;

/// Individual statements of [`SCHEMA_SQL`], in order.
pub fn statements() -> impl Iterator<Item = &'static str> {
    SCHEMA_SQL.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_statement_is_idempotent() {
        for statement in statements() {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement is not idempotent: {}",
                statement
            );
        }
    }

    #[test]
    fn test_schema_names_all_tables_and_indexes() {
        for table in TABLES {
            assert!(SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)));
        }
        for index in INDEXES {
            assert!(SCHEMA_SQL.contains(&format!("CREATE INDEX IF NOT EXISTS {} ", index)));
        }
    }

    #[test]
    fn test_statements_split_in_order() {
        let all: Vec<&str> = statements().collect();
        assert_eq!(all.len(), 1 + TABLES.len() + INDEXES.len());
        assert_eq!(all[0], r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#);
        assert!(all[1].starts_with("CREATE TABLE IF NOT EXISTS entries ("));
        assert!(all.iter().all(|s| !s.contains(';')));
    }

    #[test]
    fn test_associations_cascade() {
        assert!(SCHEMA_SQL.contains("REFERENCES entries(id) ON DELETE CASCADE"));
        assert!(SCHEMA_SQL.contains("REFERENCES tags(id) ON DELETE CASCADE"));
        assert!(SCHEMA_SQL.contains("PRIMARY KEY (entry_id, tag_id)"));
    }
}
