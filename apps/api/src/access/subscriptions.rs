//! Manual-payment subscription requests: submitted from the paywall with a
//! receipt, approved by an admin, which then applies the plan to the profile.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::access::gate::Viewer;
use crate::access::plans::Plan;
use crate::errors::AppError;
use crate::models::subscription::{SubscriptionRequestRow, STATUS_APPROVED, STATUS_AWAITING};
use crate::models::user::UserProfile;
use crate::profile::ProfileStore;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn submit(
        &self,
        user_id: Uuid,
        plan: Plan,
        receipt_url: &str,
    ) -> Result<SubscriptionRequestRow, AppError>;

    async fn list(&self) -> Result<Vec<SubscriptionRequestRow>, AppError>;

    /// Flips an awaiting request to approved. `None` if it does not exist or
    /// was already approved.
    async fn approve(&self, id: Uuid) -> Result<Option<SubscriptionRequestRow>, AppError>;

    /// Puts an approved request back to awaiting so it can be approved again.
    async fn reopen(&self, id: Uuid) -> Result<(), AppError>;
}

pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn submit(
        &self,
        user_id: Uuid,
        plan: Plan,
        receipt_url: &str,
    ) -> Result<SubscriptionRequestRow, AppError> {
        let row = sqlx::query_as::<_, SubscriptionRequestRow>(
            r#"
            INSERT INTO subscriptions_pending (id, user_id, plan, receipt_url, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, plan, receipt_url, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(plan.id())
        .bind(receipt_url)
        .bind(STATUS_AWAITING)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<SubscriptionRequestRow>, AppError> {
        let rows = sqlx::query_as::<_, SubscriptionRequestRow>(
            "SELECT id, user_id, plan, receipt_url, status, created_at \
             FROM subscriptions_pending ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn approve(&self, id: Uuid) -> Result<Option<SubscriptionRequestRow>, AppError> {
        let row = sqlx::query_as::<_, SubscriptionRequestRow>(
            r#"
            UPDATE subscriptions_pending SET status = $2
            WHERE id = $1 AND status = $3
            RETURNING id, user_id, plan, receipt_url, status, created_at
            "#,
        )
        .bind(id)
        .bind(STATUS_APPROVED)
        .bind(STATUS_AWAITING)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn reopen(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE subscriptions_pending SET status = $2 WHERE id = $1 AND status = $3")
            .bind(id)
            .bind(STATUS_AWAITING)
            .bind(STATUS_APPROVED)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub fn require_admin(viewer: &Viewer) -> Result<&UserProfile, AppError> {
    let profile = viewer.require_profile()?;
    if !viewer.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(profile)
}

/// Admin only. Newest first.
pub async fn list_requests(
    subscriptions: &dyn SubscriptionStore,
    viewer: &Viewer,
) -> Result<Vec<SubscriptionRequestRow>, AppError> {
    require_admin(viewer)?;
    subscriptions.list().await
}

/// Approves a request and applies its plan to the buyer's profile. Admin only.
/// If the grant fails the request goes back to awaiting.
pub async fn approve_request(
    subscriptions: &dyn SubscriptionStore,
    profiles: &dyn ProfileStore,
    viewer: &Viewer,
    request_id: Uuid,
    now: DateTime<Utc>,
) -> Result<UserProfile, AppError> {
    require_admin(viewer)?;

    let row = subscriptions.approve(request_id).await?.ok_or_else(|| {
        AppError::Conflict(format!(
            "Subscription request {request_id} is not awaiting approval"
        ))
    })?;

    let granted = match Plan::from_id(&row.plan) {
        Some(plan) => profiles
            .apply_plan(row.user_id, plan, now)
            .await
            .map(|profile| (plan, profile)),
        None => Err(AppError::Internal(anyhow::anyhow!(
            "Subscription request {} has unknown plan '{}'",
            row.id,
            row.plan
        ))),
    };
    let (plan, profile) = match granted {
        Ok(granted) => granted,
        Err(e) => {
            warn!("Plan for subscription request {} not applied; reopening it", row.id);
            if let Err(reopen_err) = subscriptions.reopen(row.id).await {
                error!(
                    "Subscription request {} stuck as approved without a grant: {}",
                    row.id, reopen_err
                );
            }
            return Err(e);
        }
    };

    info!(
        "Approved subscription request {} ({}) for user {}",
        row.id,
        plan.id(),
        row.user_id
    );
    Ok(profile)
}
