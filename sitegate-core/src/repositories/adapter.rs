use crate::{
    Error,
    account::{Account, AccountId, NewAccount},
    repositories::{AccountRepository, MembershipRepository, PasswordRepository, RepositoryProvider},
    site::{Membership, MembershipId, NewMembership, SiteId},
    token::Token,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements AccountRepository
pub struct AccountRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AccountRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AccountRepository for AccountRepositoryAdapter<R> {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        self.provider.account().create(account).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_email(email).await
    }

    async fn find_by_api_token(&self, token: &str) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_api_token(token).await
    }

    async fn find_by_switch_site_token(
        &self,
        token: &str,
        updated_since: DateTime<Utc>,
    ) -> Result<Option<Account>, Error> {
        self.provider
            .account()
            .find_by_switch_site_token(token, updated_since)
            .await
    }

    async fn set_api_token_if_absent(
        &self,
        id: &AccountId,
        token: &Token,
    ) -> Result<Token, Error> {
        self.provider.account().set_api_token_if_absent(id, token).await
    }

    async fn replace_api_token(
        &self,
        id: &AccountId,
        current: &Token,
        new: &Token,
    ) -> Result<bool, Error> {
        self.provider
            .account()
            .replace_api_token(id, current, new)
            .await
    }

    async fn set_switch_site_token(
        &self,
        id: &AccountId,
        token: &Token,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, Error> {
        self.provider
            .account()
            .set_switch_site_token(id, token, updated_at)
            .await
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        self.provider.account().update(account).await
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.provider.account().delete(id).await
    }
}

/// Adapter that wraps a RepositoryProvider and implements MembershipRepository
pub struct MembershipRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> MembershipRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> MembershipRepository for MembershipRepositoryAdapter<R> {
    async fn create(&self, membership: NewMembership) -> Result<Membership, Error> {
        self.provider.membership().create(membership).await
    }

    async fn find_by_account_and_site(
        &self,
        account_id: &AccountId,
        site_id: &SiteId,
    ) -> Result<Option<Membership>, Error> {
        self.provider
            .membership()
            .find_by_account_and_site(account_id, site_id)
            .await
    }

    async fn sites_for_account(&self, account_id: &AccountId) -> Result<Vec<SiteId>, Error> {
        self.provider.membership().sites_for_account(account_id).await
    }

    async fn find_by_site(&self, site_id: &SiteId) -> Result<Vec<Membership>, Error> {
        self.provider.membership().find_by_site(site_id).await
    }

    async fn count_admins(&self, site_id: &SiteId) -> Result<u64, Error> {
        self.provider.membership().count_admins(site_id).await
    }

    async fn delete_many(&self, ids: &[MembershipId]) -> Result<(), Error> {
        self.provider.membership().delete_many(ids).await
    }
}

/// Adapter that wraps a RepositoryProvider and implements PasswordRepository
pub struct PasswordRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PasswordRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error> {
        self.provider
            .password()
            .set_password_hash(account_id, hash)
            .await
    }

    async fn get_password_hash(&self, account_id: &AccountId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(account_id).await
    }
}
