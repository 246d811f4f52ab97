//! # sitegate
//!
//! sitegate manages the credentials an account uses outside of a browser
//! session and the rules that keep every site administrable:
//!
//! - API tokens issued against email and password, revocable by presenting
//!   the token itself
//! - Short-lived switch-site tokens that hand an authenticated account from
//!   one site to another
//! - Site memberships, where removing an account never leaves a site without
//!   an administrator
//!
//! ## Storage Support
//!
//! - SQLite (feature `sqlite`, enabled by default)
//!
//! Any other backend can be plugged in by implementing
//! [`RepositoryProvider`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitegate::{NewAccount, SiteGateBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sitegate = SiteGateBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let account = NewAccount::builder()
//!         .email("ada@example.com")
//!         .name("Ada")
//!         .build()?;
//!     sitegate
//!         .register_account(account, "correct horse battery")
//!         .await?;
//!
//!     let token = sitegate
//!         .create_api_token("ada@example.com", "correct horse battery")
//!         .await?;
//!     sitegate.invalidate_api_token(token.as_str()).await?;
//!
//!     Ok(())
//! }
//! ```
mod builder;

use std::sync::Arc;

use chrono::{Duration, Utc};
use sitegate_core::{
    error::StorageError,
    repositories::{
        AccountRepository, AccountRepositoryAdapter, MembershipRepositoryAdapter,
        PasswordRepositoryAdapter,
    },
    services::{AccountAuthService, HashedPasswordVerifier},
    validation::validate_password,
};

pub use builder::{NoStorage, SiteGateBuilder, SiteGateBuilderError, WithStorage};
pub use sitegate_core::{
    Account, AccountConfig, AccountId, Authenticatable, Confirmable, Error, ErrorKind, Membership,
    MembershipId, NewAccount, RandomTokenGenerator, RepositoryProvider, SiteId, Token,
    TokenGenerator,
};

#[cfg(feature = "sqlite")]
pub use sitegate_storage_sqlite::{SqlitePool, SqliteRepositoryProvider, SqliteStorage};

#[derive(Debug, thiserror::Error)]
pub enum SiteGateError {
    #[error("Auth error: {0}")]
    AuthError(#[source] Error),
    #[error("Storage error: {0}")]
    StorageError(#[source] Error),
}

impl SiteGateError {
    /// The caller-facing category of the underlying error
    pub fn kind(&self) -> ErrorKind {
        self.inner().kind()
    }

    pub fn inner(&self) -> &Error {
        match self {
            SiteGateError::AuthError(e) | SiteGateError::StorageError(e) => e,
        }
    }
}

impl From<Error> for SiteGateError {
    fn from(e: Error) -> Self {
        match e.kind() {
            ErrorKind::Persistence => SiteGateError::StorageError(e),
            _ => SiteGateError::AuthError(e),
        }
    }
}

type AuthService<R> =
    AccountAuthService<AccountRepositoryAdapter<R>, MembershipRepositoryAdapter<R>>;

/// Entry point tying a storage backend to the account, token and membership
/// services
pub struct SiteGate<R: RepositoryProvider> {
    repositories: Arc<R>,
    accounts: Arc<AccountRepositoryAdapter<R>>,
    passwords: Arc<HashedPasswordVerifier<PasswordRepositoryAdapter<R>>>,
    auth_service: Arc<AuthService<R>>,
    account_config: AccountConfig,
}

impl<R: RepositoryProvider> SiteGate<R> {
    /// Create a new instance with the default [`AccountConfig`].
    ///
    /// Migrations are not applied; call [`migrate`](Self::migrate) or use
    /// [`SiteGateBuilder::apply_migrations`].
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_repositories(repositories, AccountConfig::default())
    }

    pub(crate) fn with_repositories(repositories: Arc<R>, account_config: AccountConfig) -> Self {
        let accounts = Arc::new(AccountRepositoryAdapter::new(repositories.clone()));
        let memberships = Arc::new(MembershipRepositoryAdapter::new(repositories.clone()));
        let passwords = Arc::new(HashedPasswordVerifier::new(Arc::new(
            PasswordRepositoryAdapter::new(repositories.clone()),
        )));

        let auth_service = Arc::new(AccountAuthService::new(
            accounts.clone(),
            memberships,
            passwords.clone(),
            account_config.clone(),
        ));

        Self {
            repositories,
            accounts,
            passwords,
            auth_service,
            account_config,
        }
    }

    /// Rebuild the services with a different account configuration
    pub fn with_account_config(self, config: AccountConfig) -> Self {
        Self::with_repositories(self.repositories, config)
    }

    /// Replace the API and switch-site token sources
    pub fn with_token_generators(
        self,
        api_tokens: Arc<dyn TokenGenerator>,
        switch_site_tokens: Arc<dyn TokenGenerator>,
    ) -> Self {
        let auth_service = AccountAuthService::new(
            self.accounts.clone(),
            Arc::new(MembershipRepositoryAdapter::new(self.repositories.clone())),
            self.passwords.clone(),
            self.account_config.clone(),
        )
        .with_token_generators(api_tokens, switch_site_tokens);

        Self {
            auth_service: Arc::new(auth_service),
            ..self
        }
    }

    pub fn repositories(&self) -> &Arc<R> {
        &self.repositories
    }

    pub fn account_config(&self) -> &AccountConfig {
        &self.account_config
    }

    pub async fn migrate(&self) -> Result<(), SiteGateError> {
        self.repositories
            .migrate()
            .await
            .map_err(SiteGateError::StorageError)
    }

    pub async fn health_check(&self) -> Result<(), SiteGateError> {
        self.repositories
            .health_check()
            .await
            .map_err(SiteGateError::StorageError)
    }

    /// Store a new account together with its password.
    ///
    /// The password is checked before anything is written.
    pub async fn register_account(
        &self,
        account: NewAccount,
        password: &str,
    ) -> Result<Account, SiteGateError> {
        validate_password(password).map_err(Error::from)?;

        let account = self.auth_service.directory().register(account).await?;
        self.passwords.set_password(&account.id, password).await?;

        Ok(account)
    }

    pub async fn change_password(
        &self,
        account_id: &AccountId,
        password: &str,
    ) -> Result<(), SiteGateError> {
        self.passwords.set_password(account_id, password).await?;

        tracing::info!(account_id = %account_id, "Password changed");

        Ok(())
    }

    pub async fn get_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Account>, SiteGateError> {
        Ok(self.auth_service.directory().find_by_id(account_id).await?)
    }

    pub async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Account>, SiteGateError> {
        Ok(self.auth_service.directory().find_by_email(email).await?)
    }

    pub async fn find_account_by_api_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, SiteGateError> {
        Ok(self.auth_service.directory().find_by_api_token(token).await?)
    }

    /// Mark the account as confirmed
    pub async fn confirm_account(&self, account_id: &AccountId) -> Result<Account, SiteGateError> {
        let mut account = self
            .get_account(account_id)
            .await?
            .ok_or(SiteGateError::StorageError(Error::Storage(
                StorageError::NotFound,
            )))?;

        if account.confirmed_at.is_none() {
            account.confirmed_at = Some(Utc::now());
            account = self.accounts.update(&account).await?;
        }

        Ok(account)
    }

    /// Return the account's API token, issuing one if it has none.
    ///
    /// Unknown email and wrong password both yield
    /// [`ErrorKind::InvalidCredentials`].
    pub async fn create_api_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Token, SiteGateError> {
        Ok(self.auth_service.create_api_token(email, password).await?)
    }

    /// Revoke `token`, returning the token that was revoked
    pub async fn invalidate_api_token(&self, token: &str) -> Result<Token, SiteGateError> {
        Ok(self.auth_service.invalidate_api_token(token).await?)
    }

    pub async fn reset_switch_site_token(
        &self,
        account: &mut Account,
    ) -> Result<Token, SiteGateError> {
        Ok(self.auth_service.reset_switch_site_token(account).await?)
    }

    /// `None` for `max_age` uses the configured maximum age
    pub async fn find_account_by_switch_site_token(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<Account>, SiteGateError> {
        Ok(self
            .auth_service
            .find_account_by_switch_site_token(token, max_age)
            .await?)
    }

    pub async fn find_account_by_switch_site_token_or_fail(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Account, SiteGateError> {
        Ok(self
            .auth_service
            .find_account_by_switch_site_token_or_fail(token, max_age)
            .await?)
    }

    pub async fn add_site_membership(
        &self,
        site_id: &SiteId,
        account_id: &AccountId,
        is_admin: bool,
    ) -> Result<Membership, SiteGateError> {
        Ok(self
            .auth_service
            .registry()
            .add_membership(site_id, account_id, is_admin)
            .await?)
    }

    pub async fn sites_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<SiteId>, SiteGateError> {
        Ok(self
            .auth_service
            .registry()
            .sites_for_account(account_id)
            .await?)
    }

    pub async fn site_admin_count(&self, site_id: &SiteId) -> Result<u64, SiteGateError> {
        Ok(self.auth_service.registry().admin_count(site_id).await?)
    }

    pub async fn site_memberships(
        &self,
        site_id: &SiteId,
    ) -> Result<Vec<Membership>, SiteGateError> {
        Ok(self
            .auth_service
            .registry()
            .memberships_of_site(site_id)
            .await?)
    }

    /// Remove every membership of the account, or none of them if it is the
    /// last administrator of any of its sites
    pub async fn remove_account(&self, account: &Account) -> Result<(), SiteGateError> {
        Ok(self.auth_service.remove_account(account).await?)
    }

    /// Remove the account's memberships, then the account
    pub async fn destroy_account(&self, account: &Account) -> Result<(), SiteGateError> {
        Ok(self.auth_service.destroy_account(account).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegate_core::error::AuthError;

    #[test]
    fn test_error_routing_preserves_kind() {
        let err = SiteGateError::from(Error::Auth(AuthError::InvalidCredentials));
        assert!(matches!(err, SiteGateError::AuthError(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);

        let err = SiteGateError::from(Error::Storage(StorageError::Database("down".into())));
        assert!(matches!(err, SiteGateError::StorageError(_)));
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(err.to_string().contains("down"));
    }
}
