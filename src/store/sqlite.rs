//! SQLite-backed document store
//!
//! Each document is persisted as its JSON body plus a few indexed columns.
//! Filters are evaluated with `json_extract` against the body, so any
//! dotted field of the serialized record can be used as a predicate.

use super::{check_embedding, Document, DocumentQuery, DocumentStore, StoreStats, SCHEMA_SQL};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::query::QueryScalar;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions, SqliteSynchronous,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const DIMENSION_KEY: &str = "dimension";

/// SQLite document store handle
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the store configured for this installation
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    /// Open (and create if needed) a store at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        if !store.is_initialized().await? {
            store.init_schema().await?;
        }
        Ok(store)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing document store schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if the schema exists
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='documents'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    /// Embedding dimension fixed by the first stored document
    pub async fn dimension(&self) -> Result<Option<usize>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?")
                .bind(DIMENSION_KEY)
                .fetch_optional(&self.pool)
                .await?;

        value
            .map(|v| {
                v.parse::<usize>().map_err(|e| {
                    Error::Other(format!("Corrupt stored dimension '{}': {}", v, e))
                })
            })
            .transpose()
    }

    async fn fix_dimension(&self, dimension: usize) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO store_meta (key, value) VALUES (?, ?)")
            .bind(DIMENSION_KEY)
            .bind(dimension.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn created_at(&self, id: &str) -> Result<Option<DateTime<Utc>>> {
        let created: Option<String> =
            sqlx::query_scalar("SELECT created_at FROM documents WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(created
            .and_then(|c| DateTime::parse_from_rfc3339(&c).ok())
            .map(|c| c.with_timezone(&Utc)))
    }
}

type BodyQuery<'q> = QueryScalar<'q, Sqlite, String, SqliteArguments<'q>>;

fn bind_value<'q>(query: BodyQuery<'q>, value: &Value) -> BodyQuery<'q> {
    match value {
        Value::String(s) => query.bind(s.clone()),
        Value::Bool(b) => query.bind(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64().unwrap_or(f64::NAN)),
        },
        // Rejected by DocumentQuery::validate
        _ => query.bind(Option::<String>::None),
    }
}

fn build_query_sql(query: &DocumentQuery) -> String {
    let mut sql = String::from("SELECT body FROM documents");
    for (i, filter) in query.filters.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!("json_extract(body, ?) {} ?", filter.op.sql()));
    }
    sql.push_str(" ORDER BY seq LIMIT ?");
    sql
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn put(&self, mut document: Document) -> Result<Document> {
        let fixed = self.dimension().await?;
        check_embedding(fixed, document.embedding.len())?;
        if fixed.is_none() {
            self.fix_dimension(document.embedding.len()).await?;
        }

        let now = Utc::now();
        let created_at = self.created_at(&document.id).await?.unwrap_or(now);
        document.created_at = Some(created_at);
        document.updated_at = Some(now);

        let body = serde_json::to_string(&document)?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, doc_type, quality_score, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                doc_type = excluded.doc_type,
                quality_score = excluded.quality_score,
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&document.id)
        .bind(document.metadata.doc_type.as_str())
        .bind(f64::from(document.quality_score))
        .bind(&body)
        .bind(created_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Stored document {}", document.id);
        Ok(document)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        body.map(|b| serde_json::from_str(&b).map_err(Error::from))
            .transpose()
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
        query.validate()?;

        let sql = build_query_sql(query);
        let mut q: BodyQuery<'_> = sqlx::query_scalar(&sql);
        for filter in &query.filters {
            q = q.bind(filter.json_path());
            q = bind_value(q, &filter.value);
        }
        q = q.bind(i64::try_from(query.limit).unwrap_or(i64::MAX));

        let bodies = q.fetch_all(&self.pool).await?;
        debug!("Query matched {} documents", bodies.len());

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(Error::from))
            .collect()
    }

    async fn stats(&self) -> Result<StoreStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT doc_type, COUNT(*) FROM documents GROUP BY doc_type")
                .fetch_all(&self.pool)
                .await?;

        let relocated: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE json_extract(body, '$.content_ref') IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let by_type: BTreeMap<String, usize> = rows
            .into_iter()
            .map(|(ty, count)| (ty, count as usize))
            .collect();

        Ok(StoreStats {
            document_count: by_type.values().sum(),
            by_type,
            relocated_count: relocated as usize,
            dimension: self.dimension().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::document;
    use crate::store::{DocumentType, Filter, FilterOp};
    use tempfile::TempDir;

    async fn setup_test_store() -> (SqliteStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.db_file = tmp.path().join("test.db");

        let store = SqliteStore::connect(&config).await.unwrap();
        (store, tmp)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (store, _tmp) = setup_test_store().await;

        let stored = store
            .put(document("a", DocumentType::Code, vec![1.0, 0.0, 0.0], 0.64))
            .await
            .unwrap();
        assert!(stored.created_at.is_some());

        let loaded = store.get("a").await.unwrap().unwrap();
        assert_eq!(loaded.id, "a");
        assert_eq!(loaded.metadata.doc_type, DocumentType::Code);
        assert_eq!(loaded.quality_score, 0.64);
        assert_eq!(loaded.embedding, vec![1.0, 0.0, 0.0]);

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_created_at_and_position() {
        let (store, _tmp) = setup_test_store().await;

        let first = store
            .put(document("a", DocumentType::Code, vec![1.0, 0.0], 0.1))
            .await
            .unwrap();
        store
            .put(document("b", DocumentType::Code, vec![0.0, 1.0], 0.2))
            .await
            .unwrap();

        let mut replacement = document("a", DocumentType::Analysis, vec![0.5, 0.5], 0.9);
        replacement.summary = "rewritten".to_string();
        let second = store.put(replacement).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let all = store.query(&DocumentQuery::new(10)).await.unwrap();
        let ids: Vec<_> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(all[0].summary, "rewritten");
        assert_eq!(all[0].metadata.doc_type, DocumentType::Analysis);
    }

    #[tokio::test]
    async fn test_dimension_is_fixed_by_first_put() {
        let (store, _tmp) = setup_test_store().await;

        store
            .put(document("a", DocumentType::Code, vec![1.0, 0.0, 0.0], 0.5))
            .await
            .unwrap();
        let err = store
            .put(document("b", DocumentType::Code, vec![1.0, 0.0], 0.5))
            .await
            .expect_err("should reject mismatched dimension");

        match err {
            Error::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
        assert_eq!(store.dimension().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_query_filters_and_limit() {
        let (store, _tmp) = setup_test_store().await;

        store.put(document("c1", DocumentType::Code, vec![1.0], 0.9)).await.unwrap();
        store.put(document("d1", DocumentType::Documentation, vec![1.0], 0.8)).await.unwrap();
        store.put(document("c2", DocumentType::Code, vec![1.0], 0.3)).await.unwrap();
        store.put(document("c3", DocumentType::Code, vec![1.0], 0.72)).await.unwrap();

        let code = store
            .query(&DocumentQuery::new(10).with(Filter::doc_type(DocumentType::Code)))
            .await
            .unwrap();
        assert_eq!(code.len(), 3);

        let good_code = store
            .query(
                &DocumentQuery::new(10)
                    .with(Filter::doc_type(DocumentType::Code))
                    .with(Filter::min_quality(0.72)),
            )
            .await
            .unwrap();
        let ids: Vec<_> = good_code.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);

        let capped = store.query(&DocumentQuery::new(2)).await.unwrap();
        assert_eq!(capped.len(), 2);

        let not_code = store
            .query(&DocumentQuery::new(10).with(Filter::new(
                "metadata.type",
                FilterOp::Ne,
                "code",
            )))
            .await
            .unwrap();
        assert_eq!(not_code.len(), 1);
        assert_eq!(not_code[0].id, "d1");
    }

    #[tokio::test]
    async fn test_query_rejects_invalid_field() {
        let (store, _tmp) = setup_test_store().await;
        let result = store
            .query(&DocumentQuery::new(10).with(Filter::eq("metadata.type'); DROP TABLE documents; --", "x")))
            .await;
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn test_stats() {
        let (store, _tmp) = setup_test_store().await;
        store.put(document("a", DocumentType::Code, vec![1.0, 2.0], 0.5)).await.unwrap();
        store.put(document("b", DocumentType::Code, vec![1.0, 2.0], 0.5)).await.unwrap();
        let mut relocated = document("c", DocumentType::Conversation, vec![1.0, 2.0], 0.5);
        relocated.content_ref = Some("documents/c".to_string());
        store.put(relocated).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.document_count, 3);
        assert_eq!(stats.by_type.get("code"), Some(&2));
        assert_eq!(stats.by_type.get("conversation"), Some(&1));
        assert_eq!(stats.relocated_count, 1);
        assert_eq!(stats.dimension, Some(2));
    }
}
