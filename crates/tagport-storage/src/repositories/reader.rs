#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{NewReader, Reader};
use sqlx::SqlitePool;
use tagport_reader::traits::ReaderRegistry;
use tagport_reader::{ReaderError, Result as ReaderResult};

/// Repository trait for registered readers.
pub trait ReaderRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Reader>>;

    async fn find_by_reader_id(&self, reader_id: &str) -> StorageResult<Option<Reader>>;

    /// All readers, ordered by reader id.
    async fn find_all(&self) -> StorageResult<Vec<Reader>>;

    /// Insert a reader and return its record id.
    async fn create(&self, reader: &NewReader) -> StorageResult<i64>;

    async fn update(&self, id: i64, reader: &NewReader) -> StorageResult<()>;

    async fn delete(&self, id: i64) -> StorageResult<()>;

    async fn count_by_reader_id(&self, reader_id: &str) -> StorageResult<u64>;
}

/// SQLite implementation of [`ReaderRepository`].
///
/// Also serves as the connection manager's [`ReaderRegistry`].
#[derive(Debug, Clone)]
pub struct SqliteReaderRepository {
    pool: SqlitePool,
}

impl SqliteReaderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validate(reader: &NewReader) -> StorageResult<()> {
    if reader.reader_id.trim().is_empty() {
        return Err(StorageError::Validation(
            "reader_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl ReaderRepository for SqliteReaderRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Reader>> {
        let reader = sqlx::query_as::<_, Reader>(
            r#"
            SELECT id, reader_id, name, ip_address, port, com_port,
                   location, auto_discovered, created_at, updated_at
            FROM readers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reader)
    }

    async fn find_by_reader_id(&self, reader_id: &str) -> StorageResult<Option<Reader>> {
        let reader = sqlx::query_as::<_, Reader>(
            r#"
            SELECT id, reader_id, name, ip_address, port, com_port,
                   location, auto_discovered, created_at, updated_at
            FROM readers
            WHERE reader_id = ?
            "#,
        )
        .bind(reader_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reader)
    }

    async fn find_all(&self) -> StorageResult<Vec<Reader>> {
        let readers = sqlx::query_as::<_, Reader>(
            r#"
            SELECT id, reader_id, name, ip_address, port, com_port,
                   location, auto_discovered, created_at, updated_at
            FROM readers
            ORDER BY reader_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(readers)
    }

    async fn create(&self, reader: &NewReader) -> StorageResult<i64> {
        validate(reader)?;

        let result = sqlx::query(
            r#"
            INSERT INTO readers (
                reader_id, name, ip_address, port, com_port,
                location, auto_discovered
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reader.reader_id)
        .bind(&reader.name)
        .bind(&reader.ip_address)
        .bind(reader.port.map(i64::from))
        .bind(&reader.com_port)
        .bind(&reader.location)
        .bind(reader.auto_discovered)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, id: i64, reader: &NewReader) -> StorageResult<()> {
        validate(reader)?;

        let result = sqlx::query(
            r#"
            UPDATE readers
            SET reader_id = ?, name = ?, ip_address = ?, port = ?,
                com_port = ?, location = ?, auto_discovered = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&reader.reader_id)
        .bind(&reader.name)
        .bind(&reader.ip_address)
        .bind(reader.port.map(i64::from))
        .bind(&reader.com_port)
        .bind(&reader.location)
        .bind(reader.auto_discovered)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Reader", "id", id));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM readers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Reader", "id", id));
        }

        Ok(())
    }

    async fn count_by_reader_id(&self, reader_id: &str) -> StorageResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM readers WHERE reader_id = ?")
            .bind(reader_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

impl ReaderRegistry for SqliteReaderRepository {
    async fn count_by_reader_id(&self, reader_id: &str) -> ReaderResult<u64> {
        ReaderRepository::count_by_reader_id(self, reader_id)
            .await
            .map_err(|e| ReaderError::registry(e.to_string()))
    }

    async fn find_ids_by_reader_id(&self, reader_id: &str) -> ReaderResult<Vec<i64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT id FROM readers WHERE reader_id = ? ORDER BY id")
                .bind(reader_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ReaderError::registry(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
