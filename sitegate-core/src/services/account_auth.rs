use crate::{
    Error,
    account::{Account, AccountId, Confirmable},
    config::AccountConfig,
    error::{AuthError, MembershipError, TokenError},
    lock::KeyedLocks,
    repositories::{AccountRepository, MembershipRepository},
    services::{AccountDirectory, PasswordVerifier, SiteMembershipRegistry},
    token::{RandomTokenGenerator, Token, TokenGenerator},
};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Issues and revokes API tokens, resets switch-site tokens and guards
/// account removal against leaving a site without an administrator
pub struct AccountAuthService<A: AccountRepository, M: MembershipRepository> {
    accounts: Arc<A>,
    directory: AccountDirectory<A>,
    registry: SiteMembershipRegistry<M>,
    verifier: Arc<dyn PasswordVerifier>,
    api_tokens: Arc<dyn TokenGenerator>,
    switch_site_tokens: Arc<dyn TokenGenerator>,
    account_locks: KeyedLocks<AccountId>,
    config: AccountConfig,
}

impl<A: AccountRepository, M: MembershipRepository> AccountAuthService<A, M> {
    pub fn new(
        accounts: Arc<A>,
        memberships: Arc<M>,
        verifier: Arc<dyn PasswordVerifier>,
        config: AccountConfig,
    ) -> Self {
        Self {
            directory: AccountDirectory::new(accounts.clone(), config.clone()),
            registry: SiteMembershipRegistry::new(memberships),
            accounts,
            verifier,
            api_tokens: Arc::new(RandomTokenGenerator::new(config.api_token_bytes)),
            switch_site_tokens: Arc::new(RandomTokenGenerator::new(
                config.switch_site_token_bytes,
            )),
            account_locks: KeyedLocks::new(),
            config,
        }
    }

    /// Replace the token sources, e.g. with deterministic generators in tests
    pub fn with_token_generators(
        mut self,
        api_tokens: Arc<dyn TokenGenerator>,
        switch_site_tokens: Arc<dyn TokenGenerator>,
    ) -> Self {
        self.api_tokens = api_tokens;
        self.switch_site_tokens = switch_site_tokens;
        self
    }

    pub fn directory(&self) -> &AccountDirectory<A> {
        &self.directory
    }

    pub fn registry(&self) -> &SiteMembershipRegistry<M> {
        &self.registry
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Return the API token for the account identified by `email` and `password`.
    ///
    /// The account gets a token on first use and keeps it on later calls.
    /// Unknown emails and wrong passwords fail the same way.
    pub async fn create_api_token(&self, email: &str, password: &str) -> Result<Token, Error> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::Auth(AuthError::InvalidRequest(
                "The request must contain the account email and password".to_string(),
            )));
        }

        let Some(account) = self.directory.find_by_email(email).await? else {
            self.verifier.verify_absent(password).await;
            tracing::warn!("API token refused: unknown email");
            return Err(Error::Auth(AuthError::InvalidCredentials));
        };

        // TODO: decide whether issuing an API token should require an admin
        // membership on the requesting site.
        let token = self.ensure_api_token(&account).await?;

        if self.config.require_confirmation && !account.is_confirmed() {
            tracing::warn!(account_id = %account.id, "API token refused to unconfirmed account");
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        if !self.verifier.verify(&account, password).await? {
            tracing::warn!(account_id = %account.id, "API token refused: password mismatch");
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        tracing::info!(account_id = %account.id, "API token issued");

        Ok(token)
    }

    /// Give the account an API token unless it already has one, returning
    /// the token that ends up stored
    async fn ensure_api_token(&self, account: &Account) -> Result<Token, Error> {
        if let Some(token) = &account.api_token {
            return Ok(token.clone());
        }

        let _guard = self.account_locks.lock(&account.id).await;

        let candidate = self.api_tokens.generate();
        let stored = self
            .accounts
            .set_api_token_if_absent(&account.id, &candidate)
            .await?;

        if stored == candidate {
            tracing::debug!(account_id = %account.id, "Generated API token");
        }

        Ok(stored)
    }

    /// Revoke `token` by replacing it with a fresh value.
    ///
    /// Returns the token that was passed in, not the replacement.
    pub async fn invalidate_api_token(&self, token: &str) -> Result<Token, Error> {
        let account = self
            .directory
            .find_by_api_token(token)
            .await?
            .ok_or(Error::Token(TokenError::InvalidToken))?;

        let _guard = self.account_locks.lock(&account.id).await;

        let current = Token::new(token);
        let replacement = self.api_tokens.generate();
        let replaced = self
            .accounts
            .replace_api_token(&account.id, &current, &replacement)
            .await?;

        // Someone else rotated it between lookup and lock
        if !replaced {
            return Err(Error::Token(TokenError::InvalidToken));
        }

        tracing::info!(account_id = %account.id, "API token invalidated");

        Ok(current)
    }

    /// Give the account a new switch-site token stamped with the current time
    pub async fn reset_switch_site_token(&self, account: &mut Account) -> Result<Token, Error> {
        let token = self.switch_site_tokens.generate().sanitized();

        let updated = self
            .accounts
            .set_switch_site_token(&account.id, &token, Utc::now())
            .await?;
        *account = updated;

        tracing::info!(account_id = %account.id, "Switch-site token reset");

        Ok(token)
    }

    pub async fn find_account_by_switch_site_token(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<Account>, Error> {
        self.directory
            .find_by_switch_site_token(token, max_age)
            .await
    }

    pub async fn find_account_by_switch_site_token_or_fail(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Account, Error> {
        self.directory
            .find_by_switch_site_token_or_fail(token, max_age)
            .await
    }

    /// Remove every membership of the account.
    ///
    /// Sites are checked in ascending id order while holding all of their
    /// locks. If the account is the only administrator of any site nothing is
    /// deleted and the offending site is reported.
    pub async fn remove_account(&self, account: &Account) -> Result<(), Error> {
        let sites = self.registry.sites_for_account(&account.id).await?;
        if sites.is_empty() {
            return Ok(());
        }

        let _guards = self.registry.lock_sites(&sites).await;

        let mut removable = Vec::with_capacity(sites.len());
        for site_id in &sites {
            let Some(membership) = self.registry.membership_for(&account.id, site_id).await?
            else {
                continue;
            };

            if membership.is_admin() && self.registry.admin_count(site_id).await? == 1 {
                tracing::warn!(
                    account_id = %account.id,
                    site_id = %site_id,
                    "Refusing to remove last administrator"
                );
                return Err(Error::Membership(MembershipError::LastAdministrator {
                    site_id: site_id.clone(),
                }));
            }

            removable.push(membership.id);
        }

        self.registry.delete_memberships(&removable).await?;

        tracing::info!(
            account_id = %account.id,
            memberships = removable.len(),
            "Account memberships removed"
        );

        Ok(())
    }

    /// Remove the account's memberships and then the account itself
    pub async fn destroy_account(&self, account: &Account) -> Result<(), Error> {
        self.remove_account(account).await?;
        self.accounts.delete(&account.id).await?;

        tracing::info!(account_id = %account.id, "Account destroyed");

        Ok(())
    }
}
