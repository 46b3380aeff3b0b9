use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::access::export::attempt_export;
use crate::access::gate::{AccessStatus, ExportGrant};
use crate::access::paywall::{submit_subscription, PaywallFlow};
use crate::access::plans::{Plan, PlanInfo};
use crate::access::receipts::ReceiptUpload;
use crate::access::subscriptions::{approve_request, list_requests};
use crate::errors::AppError;
use crate::models::subscription::SubscriptionRequestRow;
use crate::models::user::UserProfile;
use crate::profile::handlers::ViewerQuery;
use crate::profile::resolve_viewer;
use crate::render::Document;
use crate::state::AppState;

/// Multipart field carrying the receipt file.
const RECEIPT_FIELD: &str = "receipt";

#[derive(Serialize)]
pub struct ExportResponse {
    pub grant: ExportGrant,
    pub remaining_credits: Option<i32>,
    pub html: String,
    pub document: Document,
}

#[derive(Deserialize)]
pub struct SelectPlanRequest {
    pub plan: Plan,
}

#[derive(Serialize)]
pub struct ReceiptSubmitted {
    pub request: SubscriptionRequestRow,
    pub paywall: PaywallFlow,
}

/// GET /api/v1/cv/access
pub async fn handle_access_status(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<AccessStatus>, AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    Ok(Json(AccessStatus::for_viewer(&viewer, Utc::now())))
}

/// GET /api/v1/cv/plans
pub async fn handle_list_plans() -> Json<Vec<PlanInfo>> {
    Json(Plan::ALL.iter().map(Plan::info).collect())
}

/// POST /api/v1/cv/sessions/:id/export
///
/// A blocked export for lack of premium or credits opens the session's paywall.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<ExportResponse>, AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    let (cv, template, education_first) = state
        .sessions
        .read(id, |s| {
            (
                s.wizard.cv.clone(),
                s.wizard.template,
                s.wizard.education_first,
            )
        })
        .await?;

    let result = attempt_export(
        state.profiles.as_ref(),
        &viewer,
        &cv,
        template,
        education_first,
        Utc::now(),
    )
    .await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(AppError::PaymentRequired) => {
            state.sessions.update(id, |s| s.paywall.open()).await?;
            return Err(AppError::PaymentRequired);
        }
        Err(e) => return Err(e),
    };

    info!(
        "Exported session {} with template {} ({:?})",
        id,
        template.id(),
        outcome.grant
    );
    Ok(Json(ExportResponse {
        grant: outcome.grant,
        remaining_credits: outcome.remaining_credits,
        html: outcome.document.to_html(),
        document: outcome.document,
    }))
}

/// POST /api/v1/cv/sessions/:id/paywall/plan
pub async fn handle_select_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectPlanRequest>,
) -> Result<Json<PaywallFlow>, AppError> {
    let flow = state
        .sessions
        .update(id, |s| s.paywall.select_plan(req.plan).map(|_| s.paywall.clone()))
        .await??;
    Ok(Json(flow))
}

/// POST /api/v1/cv/sessions/:id/paywall/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaywallFlow>, AppError> {
    let flow = state
        .sessions
        .update(id, |s| {
            s.paywall
                .proceed_to_checkout()
                .map(|_| s.paywall.clone())
        })
        .await??;
    Ok(Json(flow))
}

/// POST /api/v1/cv/sessions/:id/paywall/back
pub async fn handle_back_to_plans(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaywallFlow>, AppError> {
    let flow = state
        .sessions
        .update(id, |s| {
            s.paywall.back_to_plans();
            s.paywall.clone()
        })
        .await?;
    Ok(Json(flow))
}

/// POST /api/v1/cv/sessions/:id/paywall/close
pub async fn handle_close_paywall(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaywallFlow>, AppError> {
    let flow = state
        .sessions
        .update(id, |s| {
            s.paywall.close();
            s.paywall.clone()
        })
        .await?;
    Ok(Json(flow))
}

/// POST /api/v1/cv/sessions/:id/paywall/receipt (multipart, field `receipt`)
pub async fn handle_submit_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReceiptSubmitted>), AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    viewer.require_profile()?;

    let plan = state
        .sessions
        .read(id, |s| s.paywall.ensure_checkout().map(|_| s.paywall.selected_plan))
        .await??;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(RECEIPT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("receipt").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read receipt: {e}")))?;
        upload = Some(ReceiptUpload {
            file_name,
            content_type,
            bytes,
        });
        break;
    }
    let upload = upload.ok_or_else(|| {
        AppError::Validation("Upload the payment receipt before submitting".to_string())
    })?;

    let request = submit_subscription(
        state.receipts.as_ref(),
        state.subscriptions.as_ref(),
        &viewer,
        plan,
        &upload,
    )
    .await?;

    let paywall = state
        .sessions
        .update(id, |s| {
            s.paywall
                .mark_submitted(request.id)
                .map(|_| s.paywall.clone())
        })
        .await??;
    Ok((StatusCode::CREATED, Json(ReceiptSubmitted { request, paywall })))
}

/// GET /api/v1/admin/subscriptions
pub async fn handle_list_subscriptions(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<Vec<SubscriptionRequestRow>>, AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    Ok(Json(
        list_requests(state.subscriptions.as_ref(), &viewer).await?,
    ))
}

/// POST /api/v1/admin/subscriptions/:id/approve
pub async fn handle_approve_subscription(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<UserProfile>, AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    let profile = approve_request(
        state.subscriptions.as_ref(),
        state.profiles.as_ref(),
        &viewer,
        request_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(profile))
}
