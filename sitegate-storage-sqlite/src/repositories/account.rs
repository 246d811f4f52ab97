use crate::{ACCOUNT_COLUMNS, SqliteAccount, map_sqlx_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sitegate_core::{
    Account, AccountId, Error, NewAccount, Token, config::DEFAULT_LOCALE, error::StorageError,
    repositories::AccountRepository,
};
use sqlx::SqlitePool;

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {clause}"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch account");
            map_sqlx_error(e)
        })?;

        row.map(Account::try_from).transpose()
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteAccount>(&format!(
            r#"
            INSERT INTO accounts (id, email, name, locale, confirmed_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.id.as_str())
        .bind(&account.email)
        .bind(&account.name)
        .bind(account.locale.as_deref().unwrap_or(DEFAULT_LOCALE))
        .bind(account.confirmed_at.map(|dt| dt.timestamp()))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create account");
            map_sqlx_error(e)
        })?;

        Account::try_from(row)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.fetch_one_where("id = ?1", id.as_str()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.fetch_one_where("email = ?1", email).await
    }

    async fn find_by_api_token(&self, token: &str) -> Result<Option<Account>, Error> {
        self.fetch_one_where("api_token = ?1", token).await
    }

    async fn find_by_switch_site_token(
        &self,
        token: &str,
        updated_since: DateTime<Utc>,
    ) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM accounts
            WHERE switch_site_token = ?1 AND switch_site_token_updated_at >= ?2
            "#
        ))
        .bind(token)
        .bind(updated_since.timestamp_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch account by switch-site token");
            map_sqlx_error(e)
        })?;

        row.map(Account::try_from).transpose()
    }

    async fn set_api_token_if_absent(
        &self,
        id: &AccountId,
        token: &Token,
    ) -> Result<Token, Error> {
        sqlx::query(
            "UPDATE accounts SET api_token = ?1, updated_at = ?2 WHERE id = ?3 AND api_token IS NULL",
        )
        .bind(token.as_str())
        .bind(Utc::now().timestamp())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to set API token");
            map_sqlx_error(e)
        })?;

        // Whether or not our write won, report what is stored now
        let stored: Option<Option<String>> =
            sqlx::query_scalar("SELECT api_token FROM accounts WHERE id = ?1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        stored
            .flatten()
            .map(Token::from)
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    async fn replace_api_token(
        &self,
        id: &AccountId,
        current: &Token,
        new: &Token,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE accounts SET api_token = ?1, updated_at = ?2 WHERE id = ?3 AND api_token = ?4",
        )
        .bind(new.as_str())
        .bind(Utc::now().timestamp())
        .bind(id.as_str())
        .bind(current.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to replace API token");
            map_sqlx_error(e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_switch_site_token(
        &self,
        id: &AccountId,
        token: &Token,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>(&format!(
            r#"
            UPDATE accounts
            SET switch_site_token = ?1, switch_site_token_updated_at = ?2, updated_at = ?3
            WHERE id = ?4
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(token.as_str())
        .bind(updated_at.timestamp_millis())
        .bind(updated_at.timestamp())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to set switch-site token");
            map_sqlx_error(e)
        })?
        .ok_or(Error::Storage(StorageError::NotFound))?;

        Account::try_from(row)
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>(&format!(
            r#"
            UPDATE accounts
            SET name = ?2, locale = ?3, confirmed_at = ?4, updated_at = ?5
            WHERE id = ?1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.id.as_str())
        .bind(&account.name)
        .bind(&account.locale)
        .bind(account.confirmed_at.map(|dt| dt.timestamp()))
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to update account");
            map_sqlx_error(e)
        })?
        .ok_or(Error::Storage(StorageError::NotFound))?;

        Account::try_from(row)
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete account");
                map_sqlx_error(e)
            })?;

        Ok(())
    }
}
