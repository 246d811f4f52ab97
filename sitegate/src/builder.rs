//! Builder for constructing [`SiteGate`] instances
//!
//! Storage must be configured before [`SiteGateBuilder::build`] becomes
//! available, which the type-state markers enforce at compile time.
//!
//! ```rust,no_run
//! use sitegate::{AccountConfig, SiteGateBuilder};
//! use chrono::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sitegate = SiteGateBuilder::new()
//!     .with_sqlite("sqlite::memory:")
//!     .await?
//!     .with_account_config(
//!         AccountConfig::default().switch_site_token_max_age(Duration::seconds(30)),
//!     )
//!     .apply_migrations(true)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::Duration;
use sitegate_core::{AccountConfig, RepositoryProvider, validation::validate_locale};

use crate::SiteGate;

/// Errors that can occur when building a [`SiteGate`] instance
#[derive(Debug, thiserror::Error)]
pub enum SiteGateBuilderError {
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// No storage has been configured yet
pub struct NoStorage;

/// Storage has been configured
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

pub struct SiteGateBuilder<Storage> {
    storage: Storage,
    account_config: AccountConfig,
    apply_migrations: bool,
}

impl Default for SiteGateBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteGateBuilder<NoStorage> {
    /// Create a builder with the default [`AccountConfig`] and migrations off
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            account_config: AccountConfig::default(),
            apply_migrations: false,
        }
    }

    /// Use any storage backend
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> SiteGateBuilder<WithStorage<R>> {
        SiteGateBuilder {
            storage: WithStorage { repositories },
            account_config: self.account_config,
            apply_migrations: self.apply_migrations,
        }
    }
}

#[cfg(feature = "sqlite")]
impl SiteGateBuilder<NoStorage> {
    /// Connect to the SQLite database at `url`, e.g. `sqlite::memory:` or
    /// `sqlite://path/to/db.sqlite`
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<SiteGateBuilder<WithStorage<crate::SqliteRepositoryProvider>>, SiteGateBuilderError>
    {
        let storage = crate::SqliteStorage::connect(url)
            .await
            .map_err(|e| SiteGateBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    /// Share an existing SQLite connection pool
    pub fn with_sqlite_pool(
        self,
        pool: crate::SqlitePool,
    ) -> SiteGateBuilder<WithStorage<crate::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::SqliteRepositoryProvider::new(pool)))
    }
}

impl<R: RepositoryProvider> SiteGateBuilder<WithStorage<R>> {
    pub fn with_account_config(mut self, config: AccountConfig) -> Self {
        self.account_config = config;
        self
    }

    /// Shorthand for setting only the switch-site token lifetime
    pub fn with_switch_site_token_max_age(mut self, max_age: Duration) -> Self {
        self.account_config.switch_site_token_max_age = max_age;
        self
    }

    /// Run storage migrations during [`build`](Self::build)
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    pub async fn build(self) -> Result<SiteGate<R>, SiteGateBuilderError> {
        validate_locale(&self.account_config.default_locale)
            .map_err(|e| SiteGateBuilderError::InvalidConfiguration(e.to_string()))?;

        if self.account_config.switch_site_token_max_age < Duration::zero() {
            return Err(SiteGateBuilderError::InvalidConfiguration(
                "switch-site token max age must not be negative".to_string(),
            ));
        }

        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| SiteGateBuilderError::Migration(e.to_string()))?;
        }

        Ok(SiteGate::with_repositories(
            self.storage.repositories,
            self.account_config,
        ))
    }
}
