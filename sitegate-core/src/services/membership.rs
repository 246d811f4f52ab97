use crate::{
    Error,
    account::AccountId,
    lock::{KeyedGuard, KeyedLocks},
    repositories::MembershipRepository,
    site::{Membership, MembershipId, NewMembership, SiteId},
};
use std::sync::Arc;

/// Per-site membership queries and the site locks guarding admin removal
pub struct SiteMembershipRegistry<M: MembershipRepository> {
    repository: Arc<M>,
    site_locks: KeyedLocks<SiteId>,
}

impl<M: MembershipRepository> SiteMembershipRegistry<M> {
    pub fn new(repository: Arc<M>) -> Self {
        Self {
            repository,
            site_locks: KeyedLocks::new(),
        }
    }

    pub async fn add_membership(
        &self,
        site_id: &SiteId,
        account_id: &AccountId,
        is_admin: bool,
    ) -> Result<Membership, Error> {
        let membership = self
            .repository
            .create(NewMembership::new(
                site_id.clone(),
                account_id.clone(),
                is_admin,
            ))
            .await?;

        tracing::info!(
            site_id = %site_id,
            account_id = %account_id,
            is_admin,
            "Membership added"
        );

        Ok(membership)
    }

    pub async fn membership_for(
        &self,
        account_id: &AccountId,
        site_id: &SiteId,
    ) -> Result<Option<Membership>, Error> {
        self.repository
            .find_by_account_and_site(account_id, site_id)
            .await
    }

    /// Sites the account belongs to, in ascending site id order
    pub async fn sites_for_account(&self, account_id: &AccountId) -> Result<Vec<SiteId>, Error> {
        let mut sites = self.repository.sites_for_account(account_id).await?;
        sites.sort();
        sites.dedup();
        Ok(sites)
    }

    pub async fn admin_count(&self, site_id: &SiteId) -> Result<u64, Error> {
        self.repository.count_admins(site_id).await
    }

    pub async fn memberships_of_site(&self, site_id: &SiteId) -> Result<Vec<Membership>, Error> {
        self.repository.find_by_site(site_id).await
    }

    /// Hold the sites' locks until the returned guards are dropped
    pub async fn lock_sites(&self, sites: &[SiteId]) -> Vec<KeyedGuard<SiteId>> {
        self.site_locks.lock_all(sites).await
    }

    /// Delete the memberships in one step
    pub async fn delete_memberships(&self, ids: &[MembershipId]) -> Result<(), Error> {
        if ids.is_empty() {
            return Ok(());
        }
        self.repository.delete_many(ids).await
    }
}
