//! Profile collaborator — the slice of the auth backend's `profiles` table the
//! CV builder reads and writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::access::gate::Viewer;
use crate::access::plans::{Plan, PlanGrant};
use crate::errors::AppError;
use crate::models::user::{ProfilePatch, UserProfile};

pub mod handlers;
#[cfg(test)]
pub mod memory;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        patch: &ProfilePatch,
    ) -> Result<UserProfile, AppError>;

    /// Atomically takes one credit. Returns the remaining balance, or `None`
    /// when the balance was already zero (nothing is taken).
    async fn consume_credit(&self, user_id: Uuid) -> Result<Option<i32>, AppError>;

    async fn apply_plan(
        &self,
        user_id: Uuid,
        plan: Plan,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, AppError>;
}

const PROFILE_COLUMNS: &str =
    "id, email, full_name, phone, cv_credits, is_premium, premium_expiry, is_admin";

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        patch: &ProfilePatch,
    ) -> Result<UserProfile, AppError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone)
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(patch.full_name.as_deref())
        .bind(patch.phone.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))
    }

    async fn consume_credit(&self, user_id: Uuid) -> Result<Option<i32>, AppError> {
        // Conditional decrement: two concurrent exports can never both take the last credit.
        let remaining = sqlx::query_scalar::<_, i32>(
            "UPDATE profiles SET cv_credits = cv_credits - 1 \
             WHERE id = $1 AND cv_credits > 0 RETURNING cv_credits",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(remaining)
    }

    async fn apply_plan(
        &self,
        user_id: Uuid,
        plan: Plan,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, AppError> {
        let updated = match plan.grant() {
            PlanGrant::Credits(credits) => {
                sqlx::query_as::<_, UserProfile>(&format!(
                    "UPDATE profiles SET cv_credits = GREATEST(cv_credits, 0) + $2 \
                     WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
                ))
                .bind(user_id)
                .bind(credits)
                .fetch_optional(&self.pool)
                .await?
            }
            PlanGrant::PremiumDays(days) => {
                // Extends from any remaining premium time in one statement.
                sqlx::query_as::<_, UserProfile>(&format!(
                    "UPDATE profiles SET is_premium = TRUE, \
                     premium_expiry = GREATEST(premium_expiry, $2) + make_interval(days => $3::int) \
                     WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
                ))
                .bind(user_id)
                .bind(now)
                .bind(days)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let profile =
            updated.ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;
        info!("Applied plan {} to profile {}", plan.id(), user_id);
        Ok(profile)
    }
}

/// Resolves the request's viewer. A missing or unknown user id is treated as signed out.
pub async fn resolve_viewer(
    store: &dyn ProfileStore,
    user_id: Option<Uuid>,
) -> Result<Viewer, AppError> {
    let Some(user_id) = user_id else {
        return Ok(Viewer::anonymous());
    };
    Ok(store
        .get_profile(user_id)
        .await?
        .map(Viewer::signed_in)
        .unwrap_or_default())
}
