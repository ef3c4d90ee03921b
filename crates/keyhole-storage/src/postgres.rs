use async_trait::async_trait;
use jiff::Timestamp;
use keyhole_core::{StorageError, UrlRecord, UrlStore};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// PostgreSQL implementation of the primary store.
///
/// Reads do not filter on expiry: an expired record stays in the table
/// until deleted and is surfaced as expired by the service, never
/// silently dropped here. Short code uniqueness is enforced by the
/// `urls_short_code_key` constraint and reported as
/// [`StorageError::Conflict`].
#[derive(Debug, Clone)]
pub struct PostgresUrlStore {
    pool: PgPool,
}

impl PostgresUrlStore {
    /// Creates a store from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new connection pool.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_timestamp(seconds: i64) -> Result<Timestamp, StorageError> {
    Timestamp::from_second(seconds)
        .map_err(|e| StorageError::InvalidData(format!("invalid timestamp '{seconds}': {e}")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl UrlStore for PostgresUrlStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, short_code, original_url, created_at, expires_at, click_count
            FROM urls
            WHERE short_code = $1
            LIMIT 1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: Uuid = row.try_get("id").map_err(map_sqlx_error)?;
        let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
        let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
        let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
        let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
        let click_count: i64 = row.try_get("click_count").map_err(map_sqlx_error)?;

        Ok(Some(UrlRecord {
            id,
            short_code,
            original_url,
            created_at: parse_timestamp(created_at)?,
            expires_at: expires_at.map(parse_timestamp).transpose()?,
            click_count,
        }))
    }

    async fn insert(&self, record: UrlRecord) -> Result<UrlRecord, StorageError> {
        // Timestamps are persisted at second precision; the returned
        // snapshot matches what a later read will observe.
        let record = UrlRecord {
            created_at: parse_timestamp(record.created_at.as_second())?,
            expires_at: record
                .expires_at
                .map(|ts| parse_timestamp(ts.as_second()))
                .transpose()?,
            ..record
        };

        let result = sqlx::query(
            r#"
            INSERT INTO urls (id, short_code, original_url, created_at, expires_at, click_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.short_code)
        .bind(&record.original_url)
        .bind(record.created_at.as_second())
        .bind(record.expires_at.map(|ts| ts.as_second()))
        .bind(record.click_count)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(record.short_code))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn delete(&self, code: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM urls WHERE short_code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
