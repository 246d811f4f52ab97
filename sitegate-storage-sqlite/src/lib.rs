//! SQLite storage backend for sitegate
//!
//! ```rust,no_run
//! use sitegate_core::RepositoryProvider;
//! use sitegate_storage_sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = SqliteStorage::connect("sqlite::memory:").await?;
//! let repositories = storage.into_repository_provider();
//! repositories.migrate().await?;
//! # Ok(())
//! # }
//! ```
mod migrations;
pub mod repositories;

pub use migrations::{MigrationError, MigrationRecord, SqliteMigrationManager};
pub use repositories::{
    SqliteAccountRepository, SqliteMembershipRepository, SqlitePasswordRepository,
    SqliteRepositoryProvider,
};
pub use sqlx::SqlitePool;

use chrono::{DateTime, Utc};
use sitegate_core::{
    Account, AccountId, Error, Membership, MembershipId, SiteId, Token, error::StorageError,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Connection holder that turns into a [`SqliteRepositoryProvider`]
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url`, creating the database file if needed.
    ///
    /// In-memory databases get a single connection so every query sees the
    /// same database.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?
            .create_if_missing(true)
            .foreign_keys(true);

        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to SQLite");
                Error::Storage(StorageError::Connection(e.to_string()))
            })?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn into_repository_provider(self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool)
    }
}

pub(crate) const ACCOUNT_COLUMNS: &str = "id, email, name, locale, api_token, switch_site_token, \
     switch_site_token_updated_at, confirmed_at, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SqliteAccount {
    id: String,
    email: String,
    name: String,
    locale: String,
    api_token: Option<String>,
    switch_site_token: Option<String>,
    switch_site_token_updated_at: Option<i64>,
    confirmed_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteAccount> for Account {
    type Error = Error;

    fn try_from(account: SqliteAccount) -> Result<Self, Self::Error> {
        Account::builder()
            .id(AccountId::new(&account.id))
            .email(account.email)
            .name(account.name)
            .locale(account.locale)
            .api_token(account.api_token.map(Token::from))
            .switch_site_token(account.switch_site_token.map(Token::from))
            .switch_site_token_updated_at(
                account
                    .switch_site_token_updated_at
                    .map(timestamp_millis_to_datetime)
                    .transpose()?,
            )
            .confirmed_at(account.confirmed_at.map(timestamp_to_datetime).transpose()?)
            .created_at(timestamp_to_datetime(account.created_at)?)
            .updated_at(timestamp_to_datetime(account.updated_at)?)
            .build()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SqliteMembership {
    id: String,
    site_id: String,
    account_id: String,
    is_admin: bool,
    created_at: i64,
}

impl TryFrom<SqliteMembership> for Membership {
    type Error = Error;

    fn try_from(membership: SqliteMembership) -> Result<Self, Self::Error> {
        Ok(Membership {
            id: MembershipId::new(&membership.id),
            site_id: SiteId::new(&membership.site_id),
            account_id: AccountId::new(&membership.account_id),
            is_admin: membership.is_admin,
            created_at: timestamp_to_datetime(membership.created_at)?,
        })
    }
}

pub(crate) fn timestamp_to_datetime(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        Error::Storage(StorageError::Database(format!("Invalid timestamp: {secs}")))
    })
}

/// For `switch_site_token_updated_at`, the one column stored in milliseconds
pub(crate) fn timestamp_millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        Error::Storage(StorageError::Database(format!(
            "Invalid timestamp: {millis}ms"
        )))
    })
}

/// Map a sqlx error, turning unique violations into constraint errors
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> Error {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            Error::Storage(StorageError::Constraint(db.message().to_string()))
        }
        _ => Error::Storage(StorageError::Database(e.to_string())),
    }
}
