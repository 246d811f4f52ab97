use crate::map_sqlx_error;
use async_trait::async_trait;
use sitegate_core::{AccountId, Error, error::StorageError, repositories::PasswordRepository};
use sqlx::SqlitePool;

pub struct SqlitePasswordRepository {
    pool: SqlitePool,
}

impl SqlitePasswordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordRepository for SqlitePasswordRepository {
    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error> {
        let result = sqlx::query("UPDATE accounts SET password_hash = ?1 WHERE id = ?2")
            .bind(hash)
            .bind(account_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to set password hash");
                map_sqlx_error(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(StorageError::NotFound));
        }

        Ok(())
    }

    async fn get_password_hash(&self, account_id: &AccountId) -> Result<Option<String>, Error> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password_hash FROM accounts WHERE id = ?1")
                .bind(account_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to get password hash");
                    map_sqlx_error(e)
                })?;

        Ok(hash.flatten())
    }
}
