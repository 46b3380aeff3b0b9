//! Export transaction — gate check, credit consumption and rendering as one step.
//!
//! A credit is taken exactly once per successful call. Previews go through
//! `render` directly and never reach this module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::access::gate::{evaluate, AccessError, ExportGrant, Viewer};
use crate::errors::AppError;
use crate::models::cv::CvData;
use crate::profile::ProfileStore;
use crate::render::{render, Document, TemplateKind};

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub document: Document,
    pub grant: ExportGrant,
    /// Balance after the export; `None` for premium exports.
    pub remaining_credits: Option<i32>,
}

pub async fn attempt_export(
    profiles: &dyn ProfileStore,
    viewer: &Viewer,
    cv: &CvData,
    template: TemplateKind,
    education_first: bool,
    now: DateTime<Utc>,
) -> Result<ExportOutcome, AppError> {
    let grant = evaluate(viewer, now)?;
    let profile = viewer.require_profile()?;

    let remaining_credits = match grant {
        ExportGrant::Premium => None,
        ExportGrant::Credit => {
            // The viewer snapshot may be stale; the store has the final say.
            let remaining = profiles
                .consume_credit(profile.id)
                .await?
                .ok_or(AccessError::PaymentRequired)?;
            info!(
                "Consumed 1 CV credit for user {} ({} left)",
                profile.id, remaining
            );
            Some(remaining)
        }
    };

    let document = render(template, cv, education_first, grant != ExportGrant::Premium);

    Ok(ExportOutcome {
        document,
        grant,
        remaining_credits,
    })
}
