use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{ProfilePatch, UserProfile};
use crate::profile::resolve_viewer;
use crate::state::AppState;

/// Identifies the viewer of a request.
///
/// `user_id` is trusted as-is, including for admin routes. It must be set by
/// the upstream auth proxy from the verified session and never passed
/// through from the client; without that proxy anyone who knows an admin's
/// id can act as that admin. Unknown ids resolve to an anonymous viewer.
#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub user_id: Option<Uuid>,
}

/// PATCH /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<UserProfile>, AppError> {
    let viewer = resolve_viewer(state.profiles.as_ref(), params.user_id).await?;
    let profile = viewer.require_profile()?;

    if patch.is_empty() {
        return Ok(Json(profile.clone()));
    }

    let updated = state.profiles.update_profile(profile.id, &patch).await?;
    Ok(Json(updated))
}
