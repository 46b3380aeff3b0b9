use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::builder::improve::{ImproveKind, ImproveOutcome};
use crate::builder::session::SessionView;
use crate::builder::wizard::ImproveTarget;
use crate::errors::AppError;
use crate::models::cv::{EducationUpdate, ExperienceUpdate, FieldUpdate};
use crate::profile::handlers::ViewerQuery;
use crate::profile::resolve_viewer;
use crate::render::template::{template_options, TemplateOption};
use crate::render::TemplateKind;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ItemCreated {
    pub id: Uuid,
    pub session: SessionView,
}

#[derive(Deserialize)]
pub struct SkillRequest {
    pub value: String,
}

#[derive(Serialize)]
pub struct SkillResponse {
    pub changed: bool,
    pub session: SessionView,
}

#[derive(Deserialize)]
pub struct LayoutRequest {
    /// Unknown ids fall back to the classic template.
    pub template: Option<String>,
    pub education_first: Option<bool>,
    /// Flips the section order; ignored when `education_first` is given.
    #[serde(default)]
    pub toggle_education_first: bool,
}

#[derive(Deserialize)]
pub struct ImproveRequest {
    pub kind: ImproveKind,
    pub experience_id: Option<Uuid>,
    /// Defaults to the current value of the target field.
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct ImproveResponse {
    #[serde(flatten)]
    pub outcome: ImproveOutcome,
    pub session: SessionView,
}

/// GET /api/v1/cv/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateOption>> {
    Json(template_options())
}

/// POST /api/v1/cv/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    (StatusCode::CREATED, Json(state.sessions.open().await))
}

/// GET /api/v1/cv/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(id).await?))
}

/// DELETE /api/v1/cv/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/cv/sessions/:id/next
pub async fn handle_next_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.wizard.next();
            s.view(id)
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/cv/sessions/:id/back
pub async fn handle_back_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.wizard.back();
            s.view(id)
        })
        .await?;
    Ok(Json(view))
}

/// PATCH /api/v1/cv/sessions/:id/fields
pub async fn handle_update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.wizard.update_field(update);
            s.view(id)
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/cv/sessions/:id/experiences
pub async fn handle_add_experience(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ItemCreated>), AppError> {
    let created = state
        .sessions
        .update(id, |s| {
            let exp_id = s.wizard.add_experience();
            ItemCreated {
                id: exp_id,
                session: s.view(id),
            }
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/v1/cv/sessions/:id/experiences/:exp_id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    Path((id, exp_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<ExperienceUpdate>,
) -> Result<Json<SessionView>, AppError> {
    state
        .sessions
        .update(id, |s| {
            s.wizard
                .update_experience(exp_id, update)
                .then(|| s.view(id))
        })
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Experience {exp_id} not found")))
}

/// DELETE /api/v1/cv/sessions/:id/experiences/:exp_id
pub async fn handle_remove_experience(
    State(state): State<AppState>,
    Path((id, exp_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionView>, AppError> {
    state
        .sessions
        .update(id, |s| s.wizard.remove_experience(exp_id).then(|| s.view(id)))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Experience {exp_id} not found")))
}

/// POST /api/v1/cv/sessions/:id/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ItemCreated>), AppError> {
    let created = state
        .sessions
        .update(id, |s| {
            let edu_id = s.wizard.add_education();
            ItemCreated {
                id: edu_id,
                session: s.view(id),
            }
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/v1/cv/sessions/:id/education/:edu_id
pub async fn handle_update_education(
    State(state): State<AppState>,
    Path((id, edu_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<EducationUpdate>,
) -> Result<Json<SessionView>, AppError> {
    state
        .sessions
        .update(id, |s| {
            s.wizard
                .update_education(edu_id, update)
                .then(|| s.view(id))
        })
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Education {edu_id} not found")))
}

/// DELETE /api/v1/cv/sessions/:id/education/:edu_id
pub async fn handle_remove_education(
    State(state): State<AppState>,
    Path((id, edu_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionView>, AppError> {
    state
        .sessions
        .update(id, |s| s.wizard.remove_education(edu_id).then(|| s.view(id)))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Education {edu_id} not found")))
}

/// POST /api/v1/cv/sessions/:id/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |s| SkillResponse {
            changed: s.wizard.add_skill(&req.value),
            session: s.view(id),
        })
        .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/cv/sessions/:id/skills
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |s| SkillResponse {
            changed: s.wizard.remove_skill(&req.value),
            session: s.view(id),
        })
        .await?;
    Ok(Json(response))
}

/// PATCH /api/v1/cv/sessions/:id/layout
pub async fn handle_update_layout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            let template = req
                .template
                .as_deref()
                .map_or(s.wizard.template, TemplateKind::from_id);
            let education_first = req.education_first.unwrap_or(s.wizard.education_first);
            s.wizard.set_layout(template, education_first);
            if req.education_first.is_none() && req.toggle_education_first {
                s.wizard.toggle_education_first();
            }
            s.view(id)
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/cv/sessions/:id/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
    Json(req): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    let target = ImproveTarget::resolve(req.kind, req.experience_id)?;

    let outcome = state
        .sessions
        .improve(
            id,
            state.improver.clone(),
            viewer,
            target,
            req.text,
            state.config.improve_timeout(),
        )
        .await?;
    let session = state.sessions.view(id).await?;
    Ok(Json(ImproveResponse { outcome, session }))
}

/// GET /api/v1/cv/sessions/:id/preview
///
/// Never consumes a credit. Non-premium viewers see the watermark.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Html<String>, AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    let watermarked = !viewer.is_premium_valid(Utc::now());
    let document = state
        .sessions
        .read(id, |s| s.wizard.preview(watermarked))
        .await?;
    Ok(Html(document.to_html()))
}
