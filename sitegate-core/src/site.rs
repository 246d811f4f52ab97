//! Sites and memberships
//!
//! A site is owned elsewhere; this crate only needs its identifier. A
//! [`Membership`] joins one account to one site and says whether the account
//! administers it. Every site must keep at least one admin membership.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    account::AccountId,
    id::{generate_prefixed_id, validate_prefixed_id},
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(id: &str) -> Self {
        SiteId(id.to_string())
    }

    pub fn new_random() -> Self {
        SiteId(generate_prefixed_id("sit"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SiteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SiteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipId(String);

impl MembershipId {
    pub fn new(id: &str) -> Self {
        MembershipId(id.to_string())
    }

    pub fn new_random() -> Self {
        MembershipId(generate_prefixed_id("mbr"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "mbr")
    }
}

impl Default for MembershipId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for MembershipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for MembershipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub site_id: SiteId,
    pub account_id: AccountId,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

#[derive(Debug, Clone)]
pub struct NewMembership {
    pub id: MembershipId,
    pub site_id: SiteId,
    pub account_id: AccountId,
    pub is_admin: bool,
}

impl NewMembership {
    pub fn new(site_id: SiteId, account_id: AccountId, is_admin: bool) -> Self {
        Self {
            id: MembershipId::new_random(),
            site_id,
            account_id,
            is_admin,
        }
    }

    pub fn admin(site_id: SiteId, account_id: AccountId) -> Self {
        Self::new(site_id, account_id, true)
    }

    pub fn member(site_id: SiteId, account_id: AccountId) -> Self {
        Self::new(site_id, account_id, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_membership_ids() {
        let site = SiteId::new_random();
        let admin = NewMembership::admin(site.clone(), AccountId::new_random());
        let member = NewMembership::member(site, AccountId::new_random());

        assert!(admin.is_admin);
        assert!(!member.is_admin);
        assert!(admin.id.is_valid());
        assert_ne!(admin.id, member.id);
    }

    #[test]
    fn test_site_ids_sort_lexically() {
        let mut ids = vec![SiteId::new("sit_b"), SiteId::new("sit_a")];
        ids.sort();
        assert_eq!(ids, vec![SiteId::new("sit_a"), SiteId::new("sit_b")]);
    }
}
