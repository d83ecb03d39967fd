//! Lodge position API endpoints.

use axum::extract::State;

use super::{not_found, success, ApiResult, Json, Path, Query};
use crate::db::PositionAssignment;
use crate::errors::AppError;
use crate::models::{
    default_term_end, AssignPositionRequest, HistoryFilter, LodgePosition, LodgePositionHistory,
    PositionType,
};
use crate::AppState;

fn parse_position_type(raw: &str) -> Result<PositionType, AppError> {
    PositionType::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("Unknown position type: {}", raw)))
}

/// GET /api/positions - Current holders.
pub async fn list_positions(State(state): State<AppState>) -> ApiResult<Vec<LodgePosition>> {
    success(state.repo.list_positions().await?)
}

/// GET /api/positions/history - Archived terms, optionally for one position.
pub async fn list_position_history(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> ApiResult<Vec<LodgePositionHistory>> {
    success(state.repo.list_position_history(filter.position_type).await?)
}

/// POST /api/positions - Assign a brother to a position.
///
/// The current holder is archived as replaced. Without an explicit end date
/// the term runs for the configured number of years.
pub async fn assign_position(
    State(state): State<AppState>,
    Json(request): Json<AssignPositionRequest>,
) -> ApiResult<LodgePosition> {
    if state.repo.get_brother(&request.brother_id).await?.is_none() {
        return Err(not_found("Brother", &request.brother_id));
    }

    let assignment = PositionAssignment {
        position_type: request.position_type,
        brother_id: request.brother_id,
        start_date: request.start_date,
        end_date: request
            .end_date
            .unwrap_or_else(|| default_term_end(request.start_date, state.config.term_years)),
    };

    success(state.repo.assign_position(&assignment).await?)
}

/// DELETE /api/positions/{positionType} - Vacate a position.
pub async fn remove_position(
    State(state): State<AppState>,
    Path(position_type): Path<String>,
) -> ApiResult<LodgePositionHistory> {
    let position_type = parse_position_type(&position_type)?;
    let entry = state.repo.remove_position(position_type).await?;
    tracing::info!(
        "Position {} vacated by {}",
        position_type.as_str(),
        entry.brother_id
    );
    success(entry)
}
