//! Versioned schema migrations
//!
//! Each migration runs in its own transaction and is recorded in
//! `_sitegate_migrations`, so applying the list twice is a no-op.
use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64,
}

pub(crate) struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub up: &'static [&'static str],
    pub down: &'static [&'static str],
}

pub(crate) const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "CreateAccountsTable",
        up: &[r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                locale TEXT NOT NULL DEFAULT 'en',
                api_token TEXT UNIQUE,
                switch_site_token TEXT,
                switch_site_token_updated_at INTEGER, -- unix milliseconds
                password_hash TEXT,
                confirmed_at INTEGER,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            )"#],
        down: &["DROP TABLE IF EXISTS accounts"],
    },
    Migration {
        version: 2,
        name: "CreateMembershipsTable",
        up: &[r#"
            CREATE TABLE IF NOT EXISTS memberships (
                id TEXT PRIMARY KEY,
                site_id TEXT NOT NULL,
                account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                UNIQUE(site_id, account_id)
            )"#],
        down: &["DROP TABLE IF EXISTS memberships"],
    },
    Migration {
        version: 3,
        name: "CreateIndexes",
        up: &[
            "CREATE INDEX IF NOT EXISTS idx_accounts_switch_site_token ON accounts(switch_site_token)",
            "CREATE INDEX IF NOT EXISTS idx_memberships_account_id ON memberships(account_id)",
            "CREATE INDEX IF NOT EXISTS idx_memberships_site_admin ON memberships(site_id, is_admin)",
        ],
        down: &[
            "DROP INDEX IF EXISTS idx_memberships_site_admin",
            "DROP INDEX IF EXISTS idx_memberships_account_id",
            "DROP INDEX IF EXISTS idx_accounts_switch_site_token",
        ],
    },
];

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn table_name(&self) -> &str {
        "_sitegate_migrations"
    }

    /// Create the migration tracking table
    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            )"#,
            self.table_name()
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply every migration not yet recorded, in version order
    pub async fn up(&self) -> Result<(), MigrationError> {
        for migration in MIGRATIONS {
            if self.is_applied(migration.version).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                "Applying migration {} ({})",
                migration.name,
                migration.version
            );

            for statement in migration.up {
                sqlx::query(statement).execute(&mut *tx).await?;
            }

            sqlx::query(&format!(
                "INSERT INTO {} (version, name, applied_at) VALUES (?, ?, ?)",
                self.table_name()
            ))
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    /// Roll back every applied migration, newest first
    pub async fn down(&self) -> Result<(), MigrationError> {
        for migration in MIGRATIONS.iter().rev() {
            if !self.is_applied(migration.version).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                "Rolling back migration {} ({})",
                migration.name,
                migration.version
            );

            for statement in migration.down {
                sqlx::query(statement).execute(&mut *tx).await?;
            }

            sqlx::query(&format!(
                "DELETE FROM {} WHERE version = ?",
                self.table_name()
            ))
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let records = sqlx::query_as::<_, MigrationRecord>(&format!(
            "SELECT version, name, applied_at FROM {} ORDER BY version",
            self.table_name()
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let applied: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE version = ?)",
            self.table_name()
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }
}
