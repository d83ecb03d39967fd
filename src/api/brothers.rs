//! Brother API endpoints.

use axum::extract::State;

use super::{not_found, require, require_if_present, success, ApiResult, Json, Path, Query};
use crate::models::{Brother, BrotherFilter, CreateBrotherRequest, UpdateBrotherRequest};
use crate::AppState;

/// GET /api/brothers - List brothers, optionally by `active` and `degree`.
pub async fn list_brothers(
    State(state): State<AppState>,
    Query(filter): Query<BrotherFilter>,
) -> ApiResult<Vec<Brother>> {
    success(state.repo.list_brothers(&filter).await?)
}

/// GET /api/brothers/{id}
pub async fn get_brother(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Brother> {
    match state.repo.get_brother(&id).await? {
        Some(brother) => success(brother),
        None => Err(not_found("Brother", &id)),
    }
}

/// POST /api/brothers
pub async fn create_brother(
    State(state): State<AppState>,
    Json(request): Json<CreateBrotherRequest>,
) -> ApiResult<Brother> {
    require(&request.name, "Name")?;

    let brother = state.repo.create_brother(&request).await?;
    tracing::info!("Brother {} registered", brother.id);
    success(brother)
}

/// PUT /api/brothers/{id}
pub async fn update_brother(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBrotherRequest>,
) -> ApiResult<Brother> {
    require_if_present(&request.name, "Name")?;
    success(state.repo.update_brother(&id, &request).await?)
}

/// DELETE /api/brothers/{id}
///
/// Fails with a conflict while the brother holds a position or has signed
/// minutes. Attendance records go with the brother.
pub async fn delete_brother(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_brother(&id).await?;
    success(())
}
