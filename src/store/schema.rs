//! SQLite schema definition

/// SQL schema for the document store
pub const SCHEMA_SQL: &str = r#"
-- Documents: one row per id, full record as JSON in `body`
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    doc_type TEXT NOT NULL,
    quality_score REAL NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Store-wide settings fixed on first write (embedding dimension)
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_type ON documents(doc_type);
CREATE INDEX IF NOT EXISTS idx_documents_quality ON documents(quality_score);
"#;
