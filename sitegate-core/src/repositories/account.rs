use crate::{
    Error,
    account::{Account, AccountId, NewAccount},
    token::Token,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for account data access
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Store a new account; fails with a constraint error if the email is taken
    async fn create(&self, account: NewAccount) -> Result<Account, Error>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error>;

    /// Find an account by its already-normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error>;

    /// Find the account whose API token is exactly `token`
    async fn find_by_api_token(&self, token: &str) -> Result<Option<Account>, Error>;

    /// Find the account whose switch-site token is `token` and was reset at or
    /// after `updated_since`
    async fn find_by_switch_site_token(
        &self,
        token: &str,
        updated_since: DateTime<Utc>,
    ) -> Result<Option<Account>, Error>;

    /// Store `token` as the API token only if the account has none yet.
    ///
    /// Returns whichever token is stored once the call completes, so a caller
    /// that loses a race observes the winner's token.
    async fn set_api_token_if_absent(
        &self,
        id: &AccountId,
        token: &Token,
    ) -> Result<Token, Error>;

    /// Replace the API token with `new` only if it is still `current`.
    ///
    /// Returns `false` when the stored token no longer equals `current`.
    async fn replace_api_token(
        &self,
        id: &AccountId,
        current: &Token,
        new: &Token,
    ) -> Result<bool, Error>;

    /// Overwrite the switch-site token and its timestamp
    async fn set_switch_site_token(
        &self,
        id: &AccountId,
        token: &Token,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, Error>;

    /// Update name, locale and confirmation state
    async fn update(&self, account: &Account) -> Result<Account, Error>;

    async fn delete(&self, id: &AccountId) -> Result<(), Error>;
}
