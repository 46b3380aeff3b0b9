//! Export gate — decides whether a viewer may export a CV, and how it is paid for.
//!
//! Premium is valid for admins, or for premium users whose expiry is still in
//! the future. Everyone else needs at least one export credit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::user::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No signed-in user. The caller should present the login entry point.
    #[error("Authentication required")]
    AuthRequired,
    /// Signed in, but neither premium nor credits. The caller should present the paywall.
    #[error("Payment required")]
    PaymentRequired,
}

/// How a permitted export is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportGrant {
    /// Unlimited exports, nothing consumed.
    Premium,
    /// One credit is consumed by the export.
    Credit,
}

/// The signed-in user, if any, passed explicitly into every gated operation.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub profile: Option<UserProfile>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { profile: None }
    }

    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn require_profile(&self) -> Result<&UserProfile, AccessError> {
        self.profile.as_ref().ok_or(AccessError::AuthRequired)
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin)
    }

    /// Premium validity for the watermark decision. Anonymous viewers are never premium.
    pub fn is_premium_valid(&self, now: DateTime<Utc>) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| is_premium_valid(p, now))
    }
}

pub fn is_premium_valid(profile: &UserProfile, now: DateTime<Utc>) -> bool {
    profile.is_admin
        || (profile.is_premium && profile.premium_expiry.is_some_and(|expiry| expiry > now))
}

pub fn has_credits(profile: &UserProfile) -> bool {
    profile.cv_credits > 0
}

/// Evaluates the gate without side effects.
pub fn evaluate(viewer: &Viewer, now: DateTime<Utc>) -> Result<ExportGrant, AccessError> {
    let profile = viewer.require_profile()?;
    if is_premium_valid(profile, now) {
        Ok(ExportGrant::Premium)
    } else if has_credits(profile) {
        Ok(ExportGrant::Credit)
    } else {
        Err(AccessError::PaymentRequired)
    }
}

pub fn can_export(viewer: &Viewer, now: DateTime<Utc>) -> bool {
    evaluate(viewer, now).is_ok()
}

/// Gate status as shown to the client before any export attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessStatus {
    pub is_authenticated: bool,
    pub is_premium_valid: bool,
    pub cv_credits: i32,
    pub can_export: bool,
    pub premium_expiry: Option<DateTime<Utc>>,
}

impl AccessStatus {
    pub fn for_viewer(viewer: &Viewer, now: DateTime<Utc>) -> Self {
        Self {
            is_authenticated: viewer.is_authenticated(),
            is_premium_valid: viewer.is_premium_valid(now),
            cv_credits: viewer.profile.as_ref().map_or(0, |p| p.cv_credits.max(0)),
            can_export: can_export(viewer, now),
            premium_expiry: viewer.profile.as_ref().and_then(|p| p.premium_expiry),
        }
    }
}
