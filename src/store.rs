// src/store.rs
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::ingest::types::{join_codes, Alert, NewAlert};

/// Result of an idempotent insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Durable keyed collection of alerts, one SQLite file in WAL mode so a
/// concurrent reader never blocks on the writer.
#[derive(Clone)]
pub struct AlertStore {
    pool: Pool<Sqlite>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS alerts (
    alert_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    event TEXT NOT NULL,
    details TEXT,
    expires TEXT,
    expires_utc_ts INTEGER NOT NULL DEFAULT 0,
    url TEXT NOT NULL,
    api_url TEXT NOT NULL,
    fips_codes TEXT,
    ugc_codes TEXT,
    created INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts (created);
CREATE INDEX IF NOT EXISTS idx_alerts_expires ON alerts (expires_utc_ts);
"#;

impl AlertStore {
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        info!(path = %path.display(), "alert store opened");

        Ok(Self { pool })
    }

    /// Insert unless a row with the same identity already exists. The UNIQUE
    /// constraint on `alert_id` is the authoritative dedup; existing rows are
    /// never overwritten.
    pub async fn insert_if_absent(
        &self,
        alert: &NewAlert,
        batch: i64,
    ) -> Result<InsertOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO alerts
                (alert_id, title, event, details, expires, expires_utc_ts,
                 url, api_url, fips_codes, ugc_codes, created)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(alert_id) DO NOTHING
            "#,
        )
        .bind(&alert.alert_id)
        .bind(&alert.title)
        .bind(&alert.event)
        .bind(&alert.details)
        .bind(&alert.expires)
        .bind(alert.expires_utc_ts)
        .bind(&alert.url)
        .bind(&alert.api_url)
        .bind(join_codes(&alert.fips_codes))
        .bind(join_codes(&alert.ugc_codes))
        .bind(batch)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyExists)
        }
    }

    /// Everything first inserted under the given batch id.
    pub async fn select_by_batch(&self, batch: i64) -> Result<Vec<Alert>, sqlx::Error> {
        sqlx::query_as::<_, Alert>(
            r#"
            SELECT alert_id, title, event, details, expires, expires_utc_ts,
                   url, api_url, fips_codes, ugc_codes, created
            FROM alerts WHERE created = ?1
            "#,
        )
        .bind(batch)
        .fetch_all(&self.pool)
        .await
    }

    /// Expiry GC: drop rows whose expiry epoch fell before the cutoff.
    pub async fn delete_expired(&self, before_epoch: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alerts WHERE expires_utc_ts < ?1")
            .bind(before_epoch)
            .execute(&self.pool)
            .await?;
        debug!(deleted = result.rows_affected(), "deleted expired alerts");
        Ok(result.rows_affected())
    }

    pub async fn delete_all(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alerts").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
            .fetch_one(&self.pool)
            .await
    }

    /// Space reclaim after GC churn; scheduled on a long cadence.
    pub async fn vacuum(&self) -> Result<(), sqlx::Error> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        info!("alert store vacuumed");
        Ok(())
    }
}
