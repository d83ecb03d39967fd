//! Meeting minutes API endpoints.

use axum::extract::State;

use super::{not_found, require, require_if_present, success, ApiResult, Json, Path};
use crate::errors::AppError;
use crate::models::{
    CreateMinutesRequest, Minutes, MinutesSignature, MinutesWithSignatures, SignMinutesRequest,
    UpdateMinutesRequest,
};
use crate::AppState;

/// GET /api/minutes
pub async fn list_minutes(State(state): State<AppState>) -> ApiResult<Vec<Minutes>> {
    success(state.repo.list_minutes().await?)
}

/// GET /api/minutes/{id} - Minutes with their signatures.
pub async fn get_minutes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MinutesWithSignatures> {
    let minutes = state
        .repo
        .get_minutes(&id)
        .await?
        .ok_or_else(|| not_found("Minutes", &id))?;
    let signatures = state.repo.list_signatures(&id).await?;
    success(MinutesWithSignatures {
        minutes,
        signatures,
    })
}

/// POST /api/minutes
pub async fn create_minutes(
    State(state): State<AppState>,
    Json(request): Json<CreateMinutesRequest>,
) -> ApiResult<Minutes> {
    require(&request.title, "Title")?;
    if let Some(session_id) = request.session_id.as_deref().filter(|s| !s.trim().is_empty()) {
        if state.repo.get_session(session_id.trim()).await?.is_none() {
            return Err(not_found("Session", session_id));
        }
    }
    success(state.repo.create_minutes(&request).await?)
}

/// PUT /api/minutes/{id}
pub async fn update_minutes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMinutesRequest>,
) -> ApiResult<Minutes> {
    require_if_present(&request.title, "Title")?;
    success(state.repo.update_minutes(&id, &request).await?)
}

/// DELETE /api/minutes/{id}
pub async fn delete_minutes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_minutes(&id).await?;
    success(())
}

/// POST /api/minutes/{id}/signatures
pub async fn sign_minutes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SignMinutesRequest>,
) -> ApiResult<MinutesSignature> {
    require(&request.role, "Role")?;
    if state.repo.get_minutes(&id).await?.is_none() {
        return Err(not_found("Minutes", &id));
    }
    if state.repo.get_brother(&request.brother_id).await?.is_none() {
        return Err(not_found("Brother", &request.brother_id));
    }

    match state
        .repo
        .sign_minutes(&id, &request.brother_id, &request.role)
        .await
    {
        Ok(signature) => success(signature),
        Err(e) if e.is_conflict() => Err(AppError::Conflict(format!(
            "Brother {} already signed these minutes",
            request.brother_id
        ))),
        Err(e) => Err(e),
    }
}
