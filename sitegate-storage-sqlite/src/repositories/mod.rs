//! Repository implementations for SQLite storage

pub mod account;
pub mod membership;
pub mod password;

pub use account::SqliteAccountRepository;
pub use membership::SqliteMembershipRepository;
pub use password::SqlitePasswordRepository;

use crate::migrations::SqliteMigrationManager;
use async_trait::async_trait;
use sitegate_core::{
    Error,
    error::StorageError,
    repositories::{
        AccountRepositoryProvider, MembershipRepositoryProvider, PasswordRepositoryProvider,
        RepositoryProvider,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    account: Arc<SqliteAccountRepository>,
    membership: Arc<SqliteMembershipRepository>,
    password: Arc<SqlitePasswordRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let account = Arc::new(SqliteAccountRepository::new(pool.clone()));
        let membership = Arc::new(SqliteMembershipRepository::new(pool.clone()));
        let password = Arc::new(SqlitePasswordRepository::new(pool.clone()));

        Self {
            pool,
            account,
            membership,
            password,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AccountRepositoryProvider for SqliteRepositoryProvider {
    type AccountRepo = SqliteAccountRepository;

    fn account(&self) -> &Self::AccountRepo {
        &self.account
    }
}

impl MembershipRepositoryProvider for SqliteRepositoryProvider {
    type MembershipRepo = SqliteMembershipRepository;

    fn membership(&self) -> &Self::MembershipRepo {
        &self.membership
    }
}

impl PasswordRepositoryProvider for SqliteRepositoryProvider {
    type PasswordRepo = SqlitePasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.password
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
