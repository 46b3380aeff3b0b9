//! Paywall flow shown when an export is blocked for lack of premium or credits.
//!
//! Plans → Checkout → Pending. The user picks a plan, pays out of band
//! (Multicaixa Express), uploads the receipt and waits for an admin.

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::access::gate::Viewer;
use crate::access::plans::Plan;
use crate::access::receipts::{ReceiptStore, ReceiptUpload};
use crate::access::subscriptions::SubscriptionStore;
use crate::errors::AppError;
use crate::models::subscription::SubscriptionRequestRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaywallStep {
    #[default]
    Plans,
    Checkout,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaywallError {
    #[error("Cannot {action} while the paywall is at {from:?}")]
    InvalidTransition {
        from: PaywallStep,
        action: &'static str,
    },
}

impl From<PaywallError> for AppError {
    fn from(err: PaywallError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PaywallFlow {
    pub visible: bool,
    pub step: PaywallStep,
    pub selected_plan: Plan,
    pub pending_request: Option<Uuid>,
}

impl PaywallFlow {
    pub fn open(&mut self) {
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn select_plan(&mut self, plan: Plan) -> Result<(), PaywallError> {
        if self.step == PaywallStep::Pending {
            return Err(self.invalid("change plan"));
        }
        self.selected_plan = plan;
        Ok(())
    }

    pub fn proceed_to_checkout(&mut self) -> Result<(), PaywallError> {
        if self.step != PaywallStep::Plans {
            return Err(self.invalid("proceed to checkout"));
        }
        self.step = PaywallStep::Checkout;
        Ok(())
    }

    pub fn back_to_plans(&mut self) {
        self.step = PaywallStep::Plans;
        self.pending_request = None;
    }

    pub fn ensure_checkout(&self) -> Result<(), PaywallError> {
        if self.step != PaywallStep::Checkout {
            return Err(self.invalid("submit a receipt"));
        }
        Ok(())
    }

    pub fn mark_submitted(&mut self, request_id: Uuid) -> Result<(), PaywallError> {
        self.ensure_checkout()?;
        self.step = PaywallStep::Pending;
        self.pending_request = Some(request_id);
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> PaywallError {
        PaywallError::InvalidTransition {
            from: self.step,
            action,
        }
    }
}

/// Uploads the receipt and records the subscription request for admin review.
pub async fn submit_subscription(
    receipts: &dyn ReceiptStore,
    subscriptions: &dyn SubscriptionStore,
    viewer: &Viewer,
    plan: Plan,
    upload: &ReceiptUpload,
) -> Result<SubscriptionRequestRow, AppError> {
    let profile = viewer.require_profile()?;
    upload.validate()?;

    let receipt_url = receipts.upload(profile.id, upload).await?;
    let request = subscriptions.submit(profile.id, plan, &receipt_url).await?;
    info!(
        "Subscription request {} submitted by user {} for plan {}",
        request.id,
        profile.id,
        plan.id()
    );
    Ok(request)
}
