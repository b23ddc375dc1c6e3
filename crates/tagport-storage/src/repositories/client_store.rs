use crate::error::StorageError;
use sqlx::SqlitePool;
use tagport_reader::Result as ReaderResult;
use tagport_reader::traits::DeviceStore;

/// Client-scoped key/value store in the `client_store` table.
#[derive(Debug, Clone)]
pub struct SqliteDeviceStore {
    pool: SqlitePool,
}

impl SqliteDeviceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceStore for SqliteDeviceStore {
    async fn get(&self, key: &str) -> ReaderResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM client_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> ReaderResult<()> {
        sqlx::query(
            r#"
            INSERT INTO client_store (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE
            SET value = excluded.value, updated_at = datetime('now')
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> ReaderResult<()> {
        sqlx::query("DELETE FROM client_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
