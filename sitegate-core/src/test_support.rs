//! In-memory repositories shared by the service tests
use crate::{
    Error,
    account::{Account, AccountId, NewAccount},
    config::DEFAULT_LOCALE,
    error::{MembershipError, StorageError},
    repositories::{AccountRepository, MembershipRepository, PasswordRepository},
    site::{Membership, MembershipId, NewMembership, SiteId},
    token::Token,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MockAccountRepository {
    accounts: Mutex<HashMap<AccountId, Account>>,
    fail_writes: AtomicBool,
}

impl MockAccountRepository {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(StorageError::Database(
                "write refused".to_string(),
            )));
        }
        Ok(())
    }

    /// Move the switch-site timestamp, as if the token was reset at `at`
    pub async fn backdate_switch_site_token(&self, id: &AccountId, at: DateTime<Utc>) {
        if let Some(account) = self.accounts.lock().await.get_mut(id) {
            account.switch_site_token_updated_at = Some(at);
        }
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account, Error> {
        self.check_writable()?;
        let mut accounts = self.accounts.lock().await;
        if accounts.values().any(|a| a.email == new_account.email) {
            return Err(Error::Storage(StorageError::Constraint(
                "email already taken".to_string(),
            )));
        }

        let account = Account::builder()
            .id(new_account.id)
            .email(new_account.email)
            .name(new_account.name)
            .locale(
                new_account
                    .locale
                    .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            )
            .confirmed_at(new_account.confirmed_at)
            .build()?;
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        Ok(self.accounts.lock().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .accounts
            .lock()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_api_token(&self, token: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .accounts
            .lock()
            .await
            .values()
            .find(|a| a.api_token.as_ref().is_some_and(|t| t.as_str() == token))
            .cloned())
    }

    async fn find_by_switch_site_token(
        &self,
        token: &str,
        updated_since: DateTime<Utc>,
    ) -> Result<Option<Account>, Error> {
        Ok(self
            .accounts
            .lock()
            .await
            .values()
            .find(|a| {
                a.switch_site_token
                    .as_ref()
                    .is_some_and(|t| t.as_str() == token)
                    && a.switch_site_token_updated_at
                        .is_some_and(|at| at >= updated_since)
            })
            .cloned())
    }

    async fn set_api_token_if_absent(
        &self,
        id: &AccountId,
        token: &Token,
    ) -> Result<Token, Error> {
        self.check_writable()?;
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(id)
            .ok_or(Error::Storage(StorageError::NotFound))?;
        Ok(account.api_token.get_or_insert_with(|| token.clone()).clone())
    }

    async fn replace_api_token(
        &self,
        id: &AccountId,
        current: &Token,
        new: &Token,
    ) -> Result<bool, Error> {
        self.check_writable()?;
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(id)
            .ok_or(Error::Storage(StorageError::NotFound))?;
        if account.api_token.as_ref() != Some(current) {
            return Ok(false);
        }
        account.api_token = Some(new.clone());
        Ok(true)
    }

    async fn set_switch_site_token(
        &self,
        id: &AccountId,
        token: &Token,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, Error> {
        self.check_writable()?;
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(id)
            .ok_or(Error::Storage(StorageError::NotFound))?;
        account.switch_site_token = Some(token.clone());
        account.switch_site_token_updated_at = Some(updated_at);
        account.updated_at = updated_at;
        Ok(account.clone())
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        self.check_writable()?;
        let mut accounts = self.accounts.lock().await;
        let stored = accounts
            .get_mut(&account.id)
            .ok_or(Error::Storage(StorageError::NotFound))?;
        stored.name = account.name.clone();
        stored.locale = account.locale.clone();
        stored.confirmed_at = account.confirmed_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.check_writable()?;
        self.accounts.lock().await.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockMembershipRepository {
    memberships: Mutex<Vec<Membership>>,
}

#[async_trait]
impl MembershipRepository for MockMembershipRepository {
    async fn create(&self, membership: NewMembership) -> Result<Membership, Error> {
        let mut memberships = self.memberships.lock().await;
        if memberships
            .iter()
            .any(|m| m.site_id == membership.site_id && m.account_id == membership.account_id)
        {
            return Err(Error::Storage(StorageError::Constraint(
                "membership already exists".to_string(),
            )));
        }

        let membership = Membership {
            id: membership.id,
            site_id: membership.site_id,
            account_id: membership.account_id,
            is_admin: membership.is_admin,
            created_at: Utc::now(),
        };
        memberships.push(membership.clone());
        Ok(membership)
    }

    async fn find_by_account_and_site(
        &self,
        account_id: &AccountId,
        site_id: &SiteId,
    ) -> Result<Option<Membership>, Error> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .find(|m| &m.account_id == account_id && &m.site_id == site_id)
            .cloned())
    }

    async fn sites_for_account(&self, account_id: &AccountId) -> Result<Vec<SiteId>, Error> {
        let mut sites: Vec<SiteId> = self
            .memberships
            .lock()
            .await
            .iter()
            .filter(|m| &m.account_id == account_id)
            .map(|m| m.site_id.clone())
            .collect();
        sites.sort();
        sites.dedup();
        Ok(sites)
    }

    async fn find_by_site(&self, site_id: &SiteId) -> Result<Vec<Membership>, Error> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .filter(|m| &m.site_id == site_id)
            .cloned()
            .collect())
    }

    async fn count_admins(&self, site_id: &SiteId) -> Result<u64, Error> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .filter(|m| &m.site_id == site_id && m.is_admin)
            .count() as u64)
    }

    async fn delete_many(&self, ids: &[MembershipId]) -> Result<(), Error> {
        let mut memberships = self.memberships.lock().await;
        let mut remaining = memberships.clone();

        for id in ids {
            let Some(position) = remaining.iter().position(|m| &m.id == id) else {
                continue;
            };
            let removed = remaining.remove(position);
            if removed.is_admin
                && !remaining
                    .iter()
                    .any(|m| m.site_id == removed.site_id && m.is_admin)
            {
                return Err(Error::Membership(MembershipError::LastAdministrator {
                    site_id: removed.site_id,
                }));
            }
        }

        *memberships = remaining;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPasswordRepository {
    hashes: Mutex<HashMap<AccountId, String>>,
}

#[async_trait]
impl PasswordRepository for MockPasswordRepository {
    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error> {
        self.hashes
            .lock()
            .await
            .insert(account_id.clone(), hash.to_string());
        Ok(())
    }

    async fn get_password_hash(&self, account_id: &AccountId) -> Result<Option<String>, Error> {
        Ok(self.hashes.lock().await.get(account_id).cloned())
    }
}
