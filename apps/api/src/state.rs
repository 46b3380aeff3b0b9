use std::sync::Arc;

use crate::access::receipts::ReceiptStore;
use crate::access::subscriptions::SubscriptionStore;
use crate::builder::improve::TextImprover;
use crate::builder::session::SessionStore;
use crate::config::Config;
use crate::profile::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    /// Payment receipts. S3 / MinIO in production.
    pub receipts: Arc<dyn ReceiptStore>,
    /// AI rewriting. Failures never reach the client; see `builder::improve`.
    pub improver: Arc<dyn TextImprover>,
    pub sessions: SessionStore,
    pub config: Config,
}
