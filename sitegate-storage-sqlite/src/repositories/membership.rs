use crate::{SqliteMembership, map_sqlx_error};
use async_trait::async_trait;
use chrono::Utc;
use sitegate_core::{
    AccountId, Error, Membership, MembershipId, NewMembership, SiteId,
    error::MembershipError, repositories::MembershipRepository,
};
use sqlx::SqlitePool;

pub struct SqliteMembershipRepository {
    pool: SqlitePool,
}

impl SqliteMembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for SqliteMembershipRepository {
    async fn create(&self, membership: NewMembership) -> Result<Membership, Error> {
        let row = sqlx::query_as::<_, SqliteMembership>(
            r#"
            INSERT INTO memberships (id, site_id, account_id, is_admin, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, site_id, account_id, is_admin, created_at
            "#,
        )
        .bind(membership.id.as_str())
        .bind(membership.site_id.as_str())
        .bind(membership.account_id.as_str())
        .bind(membership.is_admin)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create membership");
            map_sqlx_error(e)
        })?;

        Membership::try_from(row)
    }

    async fn find_by_account_and_site(
        &self,
        account_id: &AccountId,
        site_id: &SiteId,
    ) -> Result<Option<Membership>, Error> {
        let row = sqlx::query_as::<_, SqliteMembership>(
            r#"
            SELECT id, site_id, account_id, is_admin, created_at
            FROM memberships
            WHERE account_id = ?1 AND site_id = ?2
            "#,
        )
        .bind(account_id.as_str())
        .bind(site_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch membership");
            map_sqlx_error(e)
        })?;

        row.map(Membership::try_from).transpose()
    }

    async fn sites_for_account(&self, account_id: &AccountId) -> Result<Vec<SiteId>, Error> {
        let sites: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT site_id FROM memberships WHERE account_id = ?1 ORDER BY site_id",
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list sites for account");
            map_sqlx_error(e)
        })?;

        Ok(sites.into_iter().map(SiteId::from).collect())
    }

    async fn find_by_site(&self, site_id: &SiteId) -> Result<Vec<Membership>, Error> {
        let rows = sqlx::query_as::<_, SqliteMembership>(
            r#"
            SELECT id, site_id, account_id, is_admin, created_at
            FROM memberships
            WHERE site_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(site_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list memberships for site");
            map_sqlx_error(e)
        })?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn count_admins(&self, site_id: &SiteId) -> Result<u64, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM memberships WHERE site_id = ?1 AND is_admin = 1",
        )
        .bind(site_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count site admins");
            map_sqlx_error(e)
        })?;

        Ok(count.max(0) as u64)
    }

    async fn delete_many(&self, ids: &[MembershipId]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // The first statement is a write, so the transaction holds the write
        // lock before any admin count is read
        for id in ids {
            let result = sqlx::query(
                r#"
                DELETE FROM memberships
                WHERE id = ?1
                  AND (
                    is_admin = 0
                    OR (
                      SELECT COUNT(*) FROM memberships AS other
                      WHERE other.site_id = memberships.site_id AND other.is_admin = 1
                    ) > 1
                  )
                "#,
            )
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete membership");
                map_sqlx_error(e)
            })?;

            if result.rows_affected() == 1 {
                continue;
            }

            let site_id: Option<String> =
                sqlx::query_scalar("SELECT site_id FROM memberships WHERE id = ?1")
                    .bind(id.as_str())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

            // Already gone
            let Some(site_id) = site_id else {
                continue;
            };

            tx.rollback().await.map_err(map_sqlx_error)?;

            tracing::warn!(site_id = %site_id, "Refusing to delete last administrator");

            return Err(Error::Membership(MembershipError::LastAdministrator {
                site_id: SiteId::from(site_id),
            }));
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(())
    }
}
