use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_all, enum_column, new_id, non_empty, now, Repository};
use crate::errors::AppError;
use crate::models::{
    CreateMinutesRequest, Minutes, MinutesSignature, MinutesStatus, UpdateMinutesRequest,
};

const MINUTES_COLUMNS: &str =
    "id, title, meeting_date, session_id, content, status, created_at, updated_at";

const SIGNATURE_SELECT: &str = "SELECT s.id, s.minutes_id, s.brother_id, b.name AS brother_name, \
     s.role, s.signed_at \
     FROM minutes_signatures s JOIN brothers b ON b.id = s.brother_id";

impl Repository {
    // ==================== MINUTES OPERATIONS ====================

    /// List minutes, most recent meeting first.
    pub async fn list_minutes(&self) -> Result<Vec<Minutes>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM minutes ORDER BY meeting_date DESC, created_at DESC",
            MINUTES_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, minutes_from_row)?)
    }

    pub async fn get_minutes(&self, id: &str) -> Result<Option<Minutes>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM minutes WHERE id = ?", MINUTES_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(minutes_from_row).transpose()?)
    }

    /// New minutes always start as drafts.
    pub async fn create_minutes(
        &self,
        request: &CreateMinutesRequest,
    ) -> Result<Minutes, AppError> {
        let minutes = Minutes {
            id: new_id(),
            title: request.title.trim().to_string(),
            meeting_date: request.meeting_date,
            session_id: non_empty(&request.session_id),
            content: request.content.clone(),
            status: MinutesStatus::Rascunho,
            created_at: now(),
            updated_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO minutes ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            MINUTES_COLUMNS
        ))
        .bind(&minutes.id)
        .bind(&minutes.title)
        .bind(minutes.meeting_date)
        .bind(&minutes.session_id)
        .bind(&minutes.content)
        .bind(minutes.status.as_str())
        .bind(&minutes.created_at)
        .bind(&minutes.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(minutes)
    }

    pub async fn update_minutes(
        &self,
        id: &str,
        request: &UpdateMinutesRequest,
    ) -> Result<Minutes, AppError> {
        let existing = self
            .get_minutes(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Minutes {} not found", id)))?;

        let minutes = Minutes {
            id: existing.id,
            title: request
                .title
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.title),
            meeting_date: request.meeting_date.unwrap_or(existing.meeting_date),
            session_id: request
                .session_id
                .as_ref()
                .map_or(existing.session_id, |_| non_empty(&request.session_id)),
            content: request.content.clone().unwrap_or(existing.content),
            status: request.status.unwrap_or(existing.status),
            created_at: existing.created_at,
            updated_at: now(),
        };

        sqlx::query(
            "UPDATE minutes SET title = ?, meeting_date = ?, session_id = ?, content = ?, \
             status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&minutes.title)
        .bind(minutes.meeting_date)
        .bind(&minutes.session_id)
        .bind(&minutes.content)
        .bind(minutes.status.as_str())
        .bind(&minutes.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(minutes)
    }

    pub async fn delete_minutes(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM minutes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Minutes {} not found", id)));
        }
        Ok(())
    }

    pub async fn list_signatures(
        &self,
        minutes_id: &str,
    ) -> Result<Vec<MinutesSignature>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE s.minutes_id = ? ORDER BY s.signed_at",
            SIGNATURE_SELECT
        ))
        .bind(minutes_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, signature_from_row)?)
    }

    /// Add a signature. Each brother signs a given set of minutes once.
    pub async fn sign_minutes(
        &self,
        minutes_id: &str,
        brother_id: &str,
        role: &str,
    ) -> Result<MinutesSignature, AppError> {
        let id = new_id();

        sqlx::query(
            "INSERT INTO minutes_signatures (id, minutes_id, brother_id, role, signed_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(minutes_id)
        .bind(brother_id)
        .bind(role.trim())
        .bind(now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(&format!("{} WHERE s.id = ?", SIGNATURE_SELECT))
            .bind(&id)
            .fetch_one(&self.pool)
            .await?;

        Ok(signature_from_row(&row)?)
    }
}

fn minutes_from_row(row: &SqliteRow) -> Result<Minutes, sqlx::Error> {
    Ok(Minutes {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        meeting_date: row.try_get("meeting_date")?,
        session_id: row.try_get("session_id")?,
        content: row.try_get("content")?,
        status: enum_column(row, "status", MinutesStatus::parse)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn signature_from_row(row: &SqliteRow) -> Result<MinutesSignature, sqlx::Error> {
    Ok(MinutesSignature {
        id: row.try_get("id")?,
        minutes_id: row.try_get("minutes_id")?,
        brother_id: row.try_get("brother_id")?,
        brother_name: row.try_get("brother_name")?,
        role: row.try_get("role")?,
        signed_at: row.try_get("signed_at")?,
    })
}
