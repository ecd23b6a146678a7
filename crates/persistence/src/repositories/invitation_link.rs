//! Invitation link repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{
    InvitationLink, LinkPatch, LinkStatistics, LinkType, LinkUnavailable, LinkUsage,
    LinksByType, ListLinksQuery, NewRegistration, RegistrationContext,
};
use domain::LinkError;
use shared::crypto::generate_link_token;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    InvitationLinkEntity, LinkOverviewEntity, LinkStateEntity, LinkTypeCountEntity, LinkTypeDb,
    LinkUsageEntity, RecentRedemptionEntity, UserStatusDb,
};
use crate::error::{is_unique_violation, RepositoryError};
use crate::metrics::QueryTimer;

macro_rules! link_columns {
    () => {
        "id, token, link_type, organization_id, organization_name, is_active, expires_at, \
         max_uses, used_count, created_by, created_at, updated_at"
    };
}

/// Input for inserting a link.
#[derive(Debug, Clone)]
pub struct NewInvitationLink {
    pub token: String,
    pub link_type: LinkType,
    pub organization_id: Option<Uuid>,
    pub organization_name: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub created_by: Option<Uuid>,
}

/// Repository for invitation link database operations.
#[derive(Clone)]
pub struct InvitationLinkRepository {
    pool: PgPool,
}

impl InvitationLinkRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new link. New links are active with a zero usage count.
    pub async fn create(&self, input: NewInvitationLink) -> Result<InvitationLink, sqlx::Error> {
        let timer = QueryTimer::new("create_invitation_link");
        let result = sqlx::query_as::<_, InvitationLinkEntity>(concat!(
            "INSERT INTO invitation_links \
             (token, link_type, organization_id, organization_name, expires_at, max_uses, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING ",
            link_columns!()
        ))
        .bind(&input.token)
        .bind(LinkTypeDb::from(input.link_type))
        .bind(input.organization_id)
        .bind(&input.organization_name)
        .bind(input.expires_at)
        .bind(input.max_uses)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(Into::into)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InvitationLink>, sqlx::Error> {
        let timer = QueryTimer::new("find_invitation_link_by_id");
        let result = sqlx::query_as::<_, InvitationLinkEntity>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM invitation_links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<InvitationLink>, sqlx::Error> {
        let timer = QueryTimer::new("find_invitation_link_by_token");
        let result = sqlx::query_as::<_, InvitationLinkEntity>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM invitation_links WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// List links newest first, optionally restricted to one inviting
    /// organization. Returns the page and the total matching count.
    pub async fn list(
        &self,
        query: &ListLinksQuery,
        organization_id: Option<Uuid>,
    ) -> Result<(Vec<InvitationLink>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_invitation_links");

        let link_type = query.link_type.map(LinkTypeDb::from);
        let is_active = query.status.map(|status| status.is_active());
        let search = query.search_term().map(escape_like);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM invitation_links
            WHERE ($1::invitation_link_type IS NULL OR link_type = $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
              AND ($3::TEXT IS NULL OR organization_name ILIKE '%' || $3 || '%')
              AND ($4::UUID IS NULL OR organization_id = $4)
            "#,
        )
        .bind(link_type)
        .bind(is_active)
        .bind(search.as_deref())
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        let result = sqlx::query_as::<_, InvitationLinkEntity>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM invitation_links \
              WHERE ($1::invitation_link_type IS NULL OR link_type = $1) \
                AND ($2::BOOLEAN IS NULL OR is_active = $2) \
                AND ($3::TEXT IS NULL OR organization_name ILIKE '%' || $3 || '%') \
                AND ($4::UUID IS NULL OR organization_id = $4) \
              ORDER BY created_at DESC, id DESC \
              LIMIT $5 OFFSET $6"
        ))
        .bind(link_type)
        .bind(is_active)
        .bind(search.as_deref())
        .bind(organization_id)
        .bind(query.per_page() as i64)
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let links = result?.into_iter().map(Into::into).collect();
        Ok((links, total))
    }

    /// Apply a partial update. A usage cap below the current count is
    /// rejected atomically with the update.
    pub async fn update(&self, id: Uuid, patch: &LinkPatch) -> Result<InvitationLink, RepositoryError> {
        let timer = QueryTimer::new("update_invitation_link");
        let result = sqlx::query_as::<_, InvitationLinkEntity>(concat!(
            "UPDATE invitation_links SET \
               organization_name = COALESCE($2, organization_name), \
               expires_at = COALESCE($3, expires_at), \
               max_uses = COALESCE($4, max_uses), \
               is_active = COALESCE($5, is_active), \
               updated_at = NOW() \
             WHERE id = $1 AND ($4::INTEGER IS NULL OR used_count <= $4) \
             RETURNING ",
            link_columns!()
        ))
        .bind(id)
        .bind(patch.organization_name.as_deref())
        .bind(patch.expires_at)
        .bind(patch.max_uses)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        if let Some(entity) = result? {
            return Ok(entity.into());
        }

        match (self.find_by_id(id).await?, patch.max_uses) {
            (Some(current), Some(requested)) => Err(LinkError::InvalidUsageCap {
                used: current.used_count,
                requested,
            }
            .into()),
            _ => Err(LinkError::NotFound.into()),
        }
    }

    /// Delete a link. Its usage records go with it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_invitation_link");
        let result = sqlx::query("DELETE FROM invitation_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();

        Ok(result?.rows_affected() > 0)
    }

    /// Usage records of a link, oldest first.
    pub async fn list_usages(&self, link_id: Uuid) -> Result<Vec<LinkUsage>, sqlx::Error> {
        let timer = QueryTimer::new("list_link_usages");
        let result = sqlx::query_as::<_, LinkUsageEntity>(
            r#"
            SELECT id, link_id, user_id, used_at
            FROM link_usages
            WHERE link_id = $1
            ORDER BY used_at, id
            "#,
        )
        .bind(link_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|rows| rows.into_iter().map(Into::into).collect())
    }

    pub async fn token_exists(&self, token: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("invitation_link_token_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invitation_links WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result
    }

    /// Generate a token not yet used by any link.
    pub async fn generate_unique_token(&self, max_attempts: u32) -> Result<String, RepositoryError> {
        for _ in 0..max_attempts {
            let token = generate_link_token();
            if !self.token_exists(&token).await? {
                return Ok(token);
            }
            tracing::warn!("Invitation link token collision, regenerating");
        }
        Err(LinkError::TokenGeneration.into())
    }

    /// Aggregate counters, per-type breakdown and the most recent redemptions.
    pub async fn statistics(&self, recent_limit: i64) -> Result<LinkStatistics, sqlx::Error> {
        let timer = QueryTimer::new("invitation_link_statistics");

        let overview = sqlx::query_as::<_, LinkOverviewEntity>(
            r#"
            SELECT
                COUNT(*) AS total_links,
                COUNT(*) FILTER (WHERE is_active) AS active_links,
                COUNT(*) FILTER (WHERE expires_at IS NOT NULL AND expires_at <= NOW()) AS expired_links,
                COUNT(*) FILTER (WHERE used_count > 0) AS used_links,
                COUNT(*) FILTER (WHERE max_uses IS NOT NULL AND used_count >= max_uses) AS exhausted_links,
                COALESCE(SUM(used_count), 0)::BIGINT AS total_redemptions
            FROM invitation_links
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let counts = sqlx::query_as::<_, LinkTypeCountEntity>(
            r#"
            SELECT link_type, COUNT(*) AS count
            FROM invitation_links
            GROUP BY link_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let recent = sqlx::query_as::<_, RecentRedemptionEntity>(
            r#"
            SELECT
                l.id AS link_id,
                l.link_type,
                l.organization_name,
                u.id AS user_id,
                u.name AS user_name,
                u.email AS user_email,
                lu.used_at
            FROM link_usages lu
            JOIN invitation_links l ON l.id = lu.link_id
            JOIN users u ON u.id = lu.user_id
            ORDER BY lu.used_at DESC, lu.id DESC
            LIMIT $1
            "#,
        )
        .bind(recent_limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(LinkStatistics {
            overview: overview.into(),
            by_type: LinksByType::from_counts(
                counts
                    .into_iter()
                    .map(|row| (LinkType::from(row.link_type), row.count)),
            ),
            recent_redemptions: recent?.into_iter().map(Into::into).collect(),
        })
    }

    /// Redeem a link: claim one usage, create the pending account and record
    /// the usage, all in one transaction.
    ///
    /// The claim is a conditional increment, so concurrent redemptions can
    /// never push `used_count` past `max_uses`. Any later failure rolls the
    /// claim back.
    pub async fn redeem(
        &self,
        token: &str,
        registrant: &NewRegistration,
    ) -> Result<RegistrationContext, RepositoryError> {
        let timer = QueryTimer::new("redeem_invitation_link");
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_as::<_, InvitationLinkEntity>(concat!(
            "UPDATE invitation_links \
             SET used_count = used_count + 1, updated_at = NOW() \
             WHERE token = $1 \
               AND is_active \
               AND (expires_at IS NULL OR expires_at > NOW()) \
               AND (max_uses IS NULL OR used_count < max_uses) \
             RETURNING ",
            link_columns!()
        ))
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let link: InvitationLink = match claimed {
            Some(entity) => entity.into(),
            None => {
                let state = sqlx::query_as::<_, LinkStateEntity>(concat!(
                    "SELECT ",
                    link_columns!(),
                    ", NOW() AS checked_at FROM invitation_links WHERE token = $1"
                ))
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?;
                timer.record();

                return Err(match state {
                    None => LinkError::NotFound.into(),
                    Some(state) => {
                        let checked_at = state.checked_at;
                        let link = InvitationLink::from(state.link);
                        // The claim lost a race with a concurrent update that
                        // has since made the link redeemable again.
                        link.check_redeemable_at(checked_at)
                            .err()
                            .unwrap_or(LinkUnavailable::Exhausted)
                            .into()
                    }
                });
            }
        };

        let role = link.link_type.granted_role();

        // Credit the inviter only while their account exists. The key-share
        // lock keeps it from being deleted before the insert commits.
        let invited_by = match domain::models::registration::inviter_of(&link) {
            Some(candidate) => {
                sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR KEY SHARE")
                    .bind(candidate)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        let inserted = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO users (name, email, password_hash, phone, role, status, invited_by, invitation_link_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at
            "#,
        )
        .bind(&registrant.name)
        .bind(&registrant.email)
        .bind(&registrant.password_hash)
        .bind(registrant.phone.as_deref())
        .bind(role.as_i16())
        .bind(UserStatusDb::Pending)
        .bind(invited_by)
        .bind(link.id)
        .fetch_one(&mut *tx)
        .await;

        let (user_id, registered_at) = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                timer.record();
                return Err(LinkError::EmailTaken.into());
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query("INSERT INTO link_usages (link_id, user_id, used_at) VALUES ($1, $2, $3)")
            .bind(link.id)
            .bind(user_id)
            .bind(registered_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();

        Ok(RegistrationContext::new(&link, user_id, invited_by, registered_at))
    }
}

/// Escapes LIKE wildcards so search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
