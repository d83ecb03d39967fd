use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_all, enum_column, new_id, non_empty, now, Repository};
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, CreateEventRequest, Event, EventFilter, EventType,
    SessionRecord, SessionStatus, UpdateEventRequest,
};

const EVENT_COLUMNS: &str =
    "id, title, description, date, time, location, event_type, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, event_id, status, created_at, finalized_at";

const ATTENDANCE_COLUMNS: &str = "id, session_id, brother_id, status, recorded_at";

impl Repository {
    // ==================== EVENT OPERATIONS ====================

    /// List events in chronological order.
    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events \
             WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2) \
             ORDER BY date, time",
            EVENT_COLUMNS
        ))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, event_from_row)?)
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(event_from_row).transpose()?)
    }

    pub async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, AppError> {
        let event = Event {
            id: new_id(),
            title: request.title.trim().to_string(),
            description: non_empty(&request.description),
            date: request.date,
            time: request.time.trim().to_string(),
            location: non_empty(&request.location),
            event_type: request.event_type,
            created_at: now(),
            updated_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO events ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            EVENT_COLUMNS
        ))
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(event.event_type.as_str())
        .bind(&event.created_at)
        .bind(&event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn update_event(
        &self,
        id: &str,
        request: &UpdateEventRequest,
    ) -> Result<Event, AppError> {
        let existing = self
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

        let event = Event {
            id: existing.id,
            title: request
                .title
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.title),
            description: request
                .description
                .as_ref()
                .map_or(existing.description, |_| non_empty(&request.description)),
            date: request.date.unwrap_or(existing.date),
            time: request
                .time
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.time),
            location: request
                .location
                .as_ref()
                .map_or(existing.location, |_| non_empty(&request.location)),
            event_type: request.event_type.unwrap_or(existing.event_type),
            created_at: existing.created_at,
            updated_at: now(),
        };

        sqlx::query(
            "UPDATE events SET title = ?, description = ?, date = ?, time = ?, location = ?, \
             event_type = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(event.event_type.as_str())
        .bind(&event.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }

    // ==================== SESSION OPERATIONS ====================

    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM sessions ORDER BY created_at DESC",
            SESSION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, session_from_row)?)
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM sessions WHERE id = ?",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(session_from_row).transpose()?)
    }

    /// Open the attendance session of an event. One session per event.
    pub async fn create_session(&self, event_id: &str) -> Result<SessionRecord, AppError> {
        let session = SessionRecord {
            id: new_id(),
            event_id: event_id.to_string(),
            status: SessionStatus::Aberta,
            created_at: now(),
            finalized_at: None,
        };

        sqlx::query(&format!(
            "INSERT INTO sessions ({}) VALUES (?, ?, ?, ?, ?)",
            SESSION_COLUMNS
        ))
        .bind(&session.id)
        .bind(&session.event_id)
        .bind(session.status.as_str())
        .bind(&session.created_at)
        .bind(&session.finalized_at)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Mark a session finalized. Finalizing twice keeps the first timestamp.
    pub async fn finalize_session(&self, id: &str) -> Result<SessionRecord, AppError> {
        let result = sqlx::query(
            "UPDATE sessions SET status = ?, finalized_at = COALESCE(finalized_at, ?) WHERE id = ?",
        )
        .bind(SessionStatus::Finalizada.as_str())
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Session {} not found", id)));
        }

        self.get_session(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    // ==================== ATTENDANCE OPERATIONS ====================

    /// Attendance records, optionally limited to one session.
    pub async fn list_attendance(
        &self,
        session_id: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM attendance_records WHERE (?1 IS NULL OR session_id = ?1) \
             ORDER BY recorded_at",
            ATTENDANCE_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, attendance_from_row)?)
    }

    pub async fn find_attendance(
        &self,
        session_id: &str,
        brother_id: &str,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM attendance_records WHERE session_id = ? AND brother_id = ?",
            ATTENDANCE_COLUMNS
        ))
        .bind(session_id)
        .bind(brother_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(attendance_from_row).transpose()?)
    }

    /// Insert an attendance record. A second record for the same brother and
    /// session fails with [`AppError::Conflict`].
    pub async fn record_attendance(
        &self,
        session_id: &str,
        brother_id: &str,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let record = AttendanceRecord {
            id: new_id(),
            session_id: session_id.to_string(),
            brother_id: brother_id.to_string(),
            status,
            recorded_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO attendance_records ({}) VALUES (?, ?, ?, ?, ?)",
            ATTENDANCE_COLUMNS
        ))
        .bind(&record.id)
        .bind(&record.session_id)
        .bind(&record.brother_id)
        .bind(record.status.as_str())
        .bind(&record.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn update_attendance(
        &self,
        id: &str,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let result = sqlx::query(
            "UPDATE attendance_records SET status = ?, recorded_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Attendance record {} not found", id)));
        }

        let row = sqlx::query(&format!(
            "SELECT {} FROM attendance_records WHERE id = ?",
            ATTENDANCE_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(attendance_from_row(&row)?)
    }
}

fn event_from_row(row: &SqliteRow) -> Result<Event, sqlx::Error> {
    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        location: row.try_get("location")?,
        event_type: enum_column(row, "event_type", EventType::parse)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn session_from_row(row: &SqliteRow) -> Result<SessionRecord, sqlx::Error> {
    Ok(SessionRecord {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        status: enum_column(row, "status", SessionStatus::parse)?,
        created_at: row.try_get("created_at")?,
        finalized_at: row.try_get("finalized_at")?,
    })
}

fn attendance_from_row(row: &SqliteRow) -> Result<AttendanceRecord, sqlx::Error> {
    Ok(AttendanceRecord {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        brother_id: row.try_get("brother_id")?,
        status: enum_column(row, "status", AttendanceStatus::parse)?,
        recorded_at: row.try_get("recorded_at")?,
    })
}
