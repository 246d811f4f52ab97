use crate::{
    Error,
    account::AccountId,
    site::{Membership, MembershipId, NewMembership, SiteId},
};
use async_trait::async_trait;

/// Repository for site membership data access
#[async_trait]
pub trait MembershipRepository: Send + Sync + 'static {
    /// Store a membership; an account holds at most one membership per site
    async fn create(&self, membership: NewMembership) -> Result<Membership, Error>;

    async fn find_by_account_and_site(
        &self,
        account_id: &AccountId,
        site_id: &SiteId,
    ) -> Result<Option<Membership>, Error>;

    /// Sites on which the account holds any membership, sorted by site id
    async fn sites_for_account(&self, account_id: &AccountId) -> Result<Vec<SiteId>, Error>;

    async fn find_by_site(&self, site_id: &SiteId) -> Result<Vec<Membership>, Error>;

    /// Number of admin memberships on the site
    async fn count_admins(&self, site_id: &SiteId) -> Result<u64, Error>;

    /// Delete all of the given memberships or none of them.
    ///
    /// The admin count is re-checked as part of the delete: if removing an
    /// administrator would leave its site with none, nothing is deleted and
    /// [`MembershipError::LastAdministrator`] is returned. Ids that no longer
    /// exist are skipped.
    ///
    /// [`MembershipError::LastAdministrator`]: crate::error::MembershipError::LastAdministrator
    async fn delete_many(&self, ids: &[MembershipId]) -> Result<(), Error>;
}
