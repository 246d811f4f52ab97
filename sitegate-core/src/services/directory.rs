use crate::{
    Error,
    account::{Account, AccountId, NewAccount},
    config::AccountConfig,
    error::TokenError,
    repositories::AccountRepository,
    validation::normalize_email,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Lookup of accounts by email, API token and switch-site token
pub struct AccountDirectory<A: AccountRepository> {
    repository: Arc<A>,
    config: AccountConfig,
}

impl<A: AccountRepository> AccountDirectory<A> {
    pub fn new(repository: Arc<A>, config: AccountConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Store a new account, giving it the configured locale if it has none
    pub async fn register(&self, account: NewAccount) -> Result<Account, Error> {
        let account = account.with_default_locale(&self.config.default_locale);
        let account = self.repository.create(account).await?;

        tracing::info!(account_id = %account.id, "Account registered");

        Ok(account)
    }

    pub async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.repository.find_by_id(id).await
    }

    /// Case-insensitive lookup by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }

        self.repository.find_by_email(&email).await
    }

    pub async fn find_by_api_token(&self, token: &str) -> Result<Option<Account>, Error> {
        if token.is_empty() {
            return Ok(None);
        }

        self.repository.find_by_api_token(token).await
    }

    /// Find the account holding `token` as a switch-site token reset no longer
    /// than `max_age` ago. `None` uses the configured maximum age.
    pub async fn find_by_switch_site_token(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<Account>, Error> {
        if token.is_empty() {
            return Ok(None);
        }

        let max_age = max_age.unwrap_or(self.config.switch_site_token_max_age);
        let now = Utc::now();

        // Out of range: a huge positive age has no lower bound, a huge
        // negative one matches nothing
        let updated_since = match now.checked_sub_signed(max_age) {
            Some(since) => since,
            None if max_age > Duration::zero() => DateTime::<Utc>::MIN_UTC,
            None => return Ok(None),
        };

        let account = self
            .repository
            .find_by_switch_site_token(token, updated_since)
            .await?
            .filter(|account| account.switch_site_token_matches(token, max_age, now));

        if account.is_none() {
            tracing::debug!("No fresh account for switch-site token");
        }

        Ok(account)
    }

    /// Like [`find_by_switch_site_token`](Self::find_by_switch_site_token) but
    /// a miss is an error carrying the token
    pub async fn find_by_switch_site_token_or_fail(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Account, Error> {
        self.find_by_switch_site_token(token, max_age)
            .await?
            .ok_or_else(|| Error::Token(TokenError::NotFound(token.to_string())))
    }
}
