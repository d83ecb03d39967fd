//! Agenda, session and attendance API endpoints.

use axum::extract::State;
use serde::Deserialize;

use super::{not_found, require, require_if_present, success, ApiResult, Json, Path, Query};
use crate::agenda::{find_conflicts, is_valid_time};
use crate::attendance::frequency;
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, BrotherFilter, ConflictQuery, CreateEventRequest, CreateSessionRequest,
    Event, EventConflict, EventFilter, MemberFrequency, RecordAttendanceRequest, ScheduledEvent,
    SessionRecord, UpdateAttendanceRequest, UpdateEventRequest,
};
use crate::AppState;

fn validate_time(time: &str) -> Result<(), AppError> {
    if !is_valid_time(time.trim()) {
        return Err(AppError::Validation(format!(
            "Time must be HH:MM, got {:?}",
            time
        )));
    }
    Ok(())
}

/// Conflicts of a saved event against the rest of the agenda.
async fn conflicts_for(state: &AppState, event: &Event) -> Result<Vec<EventConflict>, AppError> {
    let events = state.repo.list_events(&EventFilter::default()).await?;
    Ok(find_conflicts(
        event.date,
        &event.time,
        event.location.as_deref(),
        Some(&event.id),
        &events,
        &state.config.default_location,
    ))
}

// ==================== EVENTS ====================

/// GET /api/events - Events, optionally between `from` and `to`.
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Vec<Event>> {
    success(state.repo.list_events(&filter).await?)
}

/// GET /api/events/{id}
pub async fn get_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    match state.repo.get_event(&id).await? {
        Some(event) => success(event),
        None => Err(not_found("Event", &id)),
    }
}

/// POST /api/events - Schedule an event.
///
/// Conflicts never block the write; they come back alongside the event.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<ScheduledEvent> {
    require(&request.title, "Title")?;
    validate_time(&request.time)?;

    let event = state.repo.create_event(&request).await?;
    let conflicts = conflicts_for(&state, &event).await?;
    if !conflicts.is_empty() {
        tracing::info!(
            "Event {} scheduled with {} conflict(s)",
            event.id,
            conflicts.len()
        );
    }
    success(ScheduledEvent { event, conflicts })
}

/// PUT /api/events/{id}
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<ScheduledEvent> {
    require_if_present(&request.title, "Title")?;
    if let Some(time) = &request.time {
        validate_time(time)?;
    }

    let event = state.repo.update_event(&id, &request).await?;
    let conflicts = conflicts_for(&state, &event).await?;
    success(ScheduledEvent { event, conflicts })
}

/// DELETE /api/events/{id} - Also drops the event's session and attendance.
pub async fn delete_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_event(&id).await?;
    success(())
}

/// GET /api/events/conflicts - Check a candidate slot without saving it.
pub async fn check_conflicts(
    State(state): State<AppState>,
    Query(query): Query<ConflictQuery>,
) -> ApiResult<Vec<EventConflict>> {
    validate_time(&query.time)?;

    let events = state.repo.list_events(&EventFilter::default()).await?;
    success(find_conflicts(
        query.date,
        &query.time,
        query.location.as_deref(),
        query.exclude_id.as_deref(),
        &events,
        &state.config.default_location,
    ))
}

// ==================== SESSIONS ====================

/// GET /api/sessions
pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Vec<SessionRecord>> {
    success(state.repo.list_sessions().await?)
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionRecord> {
    match state.repo.get_session(&id).await? {
        Some(session) => success(session),
        None => Err(not_found("Session", &id)),
    }
}

/// POST /api/sessions - Open attendance for an event.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<SessionRecord> {
    if state.repo.get_event(&request.event_id).await?.is_none() {
        return Err(not_found("Event", &request.event_id));
    }
    success(state.repo.create_session(&request.event_id).await?)
}

/// POST /api/sessions/{id}/finalize - Close the session; from now on it
/// counts towards frequency.
pub async fn finalize_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionRecord> {
    let session = state.repo.finalize_session(&id).await?;
    tracing::info!("Session {} finalized", session.id);
    success(session)
}

// ==================== ATTENDANCE ====================

/// GET /api/sessions/{id}/attendance
pub async fn list_session_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<AttendanceRecord>> {
    success(state.repo.list_attendance(Some(&id)).await?)
}

/// POST /api/sessions/{id}/attendance
///
/// Recording the same brother twice is not an error: the record already on
/// file is returned unchanged.
pub async fn record_attendance(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<RecordAttendanceRequest>,
) -> ApiResult<AttendanceRecord> {
    require(&request.brother_id, "Brother")?;
    if state.repo.get_session(&session_id).await?.is_none() {
        return Err(not_found("Session", &session_id));
    }
    if state.repo.get_brother(&request.brother_id).await?.is_none() {
        return Err(not_found("Brother", &request.brother_id));
    }

    match state
        .repo
        .record_attendance(&session_id, &request.brother_id, request.status)
        .await
    {
        Ok(record) => success(record),
        Err(e) if e.is_conflict() => {
            match state
                .repo
                .find_attendance(&session_id, &request.brother_id)
                .await?
            {
                Some(existing) => {
                    tracing::info!(
                        "Attendance of {} in session {} already recorded",
                        request.brother_id,
                        session_id
                    );
                    success(existing)
                }
                None => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// PUT /api/attendance/{id} - Change the status of a record.
pub async fn update_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAttendanceRequest>,
) -> ApiResult<AttendanceRecord> {
    success(state.repo.update_attendance(&id, request.status).await?)
}

/// GET /api/attendance/frequency - Frequency of every active brother.
pub async fn attendance_frequency(
    State(state): State<AppState>,
) -> ApiResult<Vec<MemberFrequency>> {
    success(member_frequency(&state).await?)
}

pub(super) async fn member_frequency(state: &AppState) -> Result<Vec<MemberFrequency>, AppError> {
    let roster = state
        .repo
        .list_brothers(&BrotherFilter {
            active: Some(true),
            degree: None,
        })
        .await?;
    let sessions = state.repo.list_sessions().await?;
    let records = state.repo.list_attendance(None).await?;

    Ok(frequency(&roster, &sessions, &records))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// GET /api/attendance - All records, or those of `sessionId`.
pub async fn list_attendance(
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> ApiResult<Vec<AttendanceRecord>> {
    success(state.repo.list_attendance(query.session_id.as_deref()).await?)
}
