use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_AWAITING: &str = "awaiting";
pub const STATUS_APPROVED: &str = "approved";

/// A manual-payment subscription request waiting for admin review.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub receipt_url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
