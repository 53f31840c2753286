//! Skillgauge Cache - SQLite store for documents and their last results
//!
//! Owns the persisted mapping from document key to raw content and to the
//! last ScoreResult/ScanResult. The engine consumes these read-only: the
//! recommend pipeline feeds cached evaluations straight to the ranker
//! without re-invoking the scorer, and batch evaluation uses them to skip
//! already-evaluated documents.

use skillgauge_types::{ScanResult, ScoreResult, SkillDocument, SkillType};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;

/// Cache store errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying SQLite failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored result payload no longer deserializes
    #[error("stored payload for '{key}' is invalid: {source}")]
    Payload {
        /// Document key of the corrupt row
        key: String,
        source: serde_json::Error,
    },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, CacheError>;

/// SQLite-backed store for skill documents and their evaluation results.
///
/// Result rows keep the full result as JSON plus a few scalar columns so
/// the database stays inspectable with plain `sqlite3`.
pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    /// Open (or create) the store at the given path.
    pub async fn new(database_path: &str) -> Result<Self> {
        let database_url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePool::connect(&database_url).await?;

        let store = Self { pool };
        store.run_migrations().await?;

        info!("Cache store initialized with database: {database_path}");
        Ok(store)
    }

    /// In-memory store, for tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                title TEXT,
                content TEXT NOT NULL,
                doc_type TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS evaluations (
                doc_key TEXT PRIMARY KEY,
                result TEXT NOT NULL,
                weighted_score REAL NOT NULL,
                verdict TEXT NOT NULL,
                evaluated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS scans (
                doc_key TEXT PRIMARY KEY,
                result TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                recommendation TEXT NOT NULL,
                scanned_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a document under its identity key.
    pub async fn save_document(&self, document: &SkillDocument) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO documents (key, title, content, doc_type, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&document.key)
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.doc_type.label())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load one document by key.
    pub async fn load_document(&self, key: &str) -> Result<Option<SkillDocument>> {
        let row = sqlx::query("SELECT key, title, content, doc_type FROM documents WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| document_from_row(&row)))
    }

    /// Load every stored document, ordered by key.
    pub async fn load_documents(&self) -> Result<Vec<SkillDocument>> {
        let rows =
            sqlx::query("SELECT key, title, content, doc_type FROM documents ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    /// Upsert the last quality evaluation for a document.
    pub async fn save_score(&self, result: &ScoreResult) -> Result<()> {
        let payload = serde_json::to_string(result).map_err(|source| CacheError::Payload {
            key: result.doc_key.clone(),
            source,
        })?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO evaluations
                (doc_key, result, weighted_score, verdict, evaluated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.doc_key)
        .bind(payload)
        .bind(result.weighted_score)
        .bind(result.verdict.label())
        .bind(result.evaluated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the last quality evaluation for one document.
    pub async fn load_score(&self, key: &str) -> Result<Option<ScoreResult>> {
        let row = sqlx::query("SELECT doc_key, result FROM evaluations WHERE doc_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| score_from_row(&row)).transpose()
    }

    /// Load every stored quality evaluation, ordered by key.
    pub async fn load_scores(&self) -> Result<Vec<ScoreResult>> {
        let rows = sqlx::query("SELECT doc_key, result FROM evaluations ORDER BY doc_key")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(score_from_row).collect()
    }

    /// Upsert the last security scan for a document.
    pub async fn save_scan(&self, scan: &ScanResult) -> Result<()> {
        let payload = serde_json::to_string(scan).map_err(|source| CacheError::Payload {
            key: scan.doc_key.clone(),
            source,
        })?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO scans
                (doc_key, result, risk_level, recommendation, scanned_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&scan.doc_key)
        .bind(payload)
        .bind(scan.risk_level.label())
        .bind(scan.recommendation.label())
        .bind(scan.scanned_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the last security scan for one document.
    pub async fn load_scan(&self, key: &str) -> Result<Option<ScanResult>> {
        let row = sqlx::query("SELECT doc_key, result FROM scans WHERE doc_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let key: String = row.get("doc_key");
            let payload: String = row.get("result");
            serde_json::from_str(&payload).map_err(|source| CacheError::Payload { key, source })
        })
        .transpose()
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> SkillDocument {
    let doc_type = match row.get::<String, _>("doc_type").as_str() {
        "index" => SkillType::Index,
        _ => SkillType::SelfContained,
    };
    SkillDocument::new(
        row.get::<String, _>("key"),
        row.get("title"),
        row.get::<String, _>("content"),
        doc_type,
    )
}

fn score_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ScoreResult> {
    let key: String = row.get("doc_key");
    let payload: String = row.get("result");
    serde_json::from_str(&payload).map_err(|source| CacheError::Payload { key, source })
}
