use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_all, enum_column, new_id, non_empty, now, Repository};
use crate::errors::AppError;
use crate::models::{Brother, BrotherFilter, CreateBrotherRequest, Degree, UpdateBrotherRequest};

const BROTHER_COLUMNS: &str = "id, name, cim, degree, email, phone, birth_date, initiation_date, \
     photo_url, active, created_at, updated_at";

impl Repository {
    // ==================== BROTHER OPERATIONS ====================

    /// List brothers ordered by name.
    pub async fn list_brothers(&self, filter: &BrotherFilter) -> Result<Vec<Brother>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM brothers \
             WHERE (?1 IS NULL OR active = ?1) AND (?2 IS NULL OR degree = ?2) \
             ORDER BY name",
            BROTHER_COLUMNS
        ))
        .bind(filter.active)
        .bind(filter.degree.map(|d| d.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, brother_from_row)?)
    }

    /// Get a brother by ID.
    pub async fn get_brother(&self, id: &str) -> Result<Option<Brother>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM brothers WHERE id = ?",
            BROTHER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(brother_from_row).transpose()?)
    }

    /// Create a new brother.
    pub async fn create_brother(
        &self,
        request: &CreateBrotherRequest,
    ) -> Result<Brother, AppError> {
        let brother = Brother {
            id: new_id(),
            name: request.name.trim().to_string(),
            cim: non_empty(&request.cim),
            degree: request.degree,
            email: non_empty(&request.email),
            phone: non_empty(&request.phone),
            birth_date: request.birth_date,
            initiation_date: request.initiation_date,
            photo_url: non_empty(&request.photo_url),
            active: request.active,
            created_at: now(),
            updated_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO brothers ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            BROTHER_COLUMNS
        ))
        .bind(&brother.id)
        .bind(&brother.name)
        .bind(&brother.cim)
        .bind(brother.degree.as_str())
        .bind(&brother.email)
        .bind(&brother.phone)
        .bind(brother.birth_date)
        .bind(brother.initiation_date)
        .bind(&brother.photo_url)
        .bind(brother.active)
        .bind(&brother.created_at)
        .bind(&brother.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(brother)
    }

    /// Update a brother. Omitted fields keep their current value.
    pub async fn update_brother(
        &self,
        id: &str,
        request: &UpdateBrotherRequest,
    ) -> Result<Brother, AppError> {
        let existing = self
            .get_brother(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Brother {} not found", id)))?;

        let brother = Brother {
            id: existing.id,
            name: request
                .name
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.name),
            cim: request.cim.as_ref().map_or(existing.cim, |_| non_empty(&request.cim)),
            degree: request.degree.unwrap_or(existing.degree),
            email: request
                .email
                .as_ref()
                .map_or(existing.email, |_| non_empty(&request.email)),
            phone: request
                .phone
                .as_ref()
                .map_or(existing.phone, |_| non_empty(&request.phone)),
            birth_date: request.birth_date.or(existing.birth_date),
            initiation_date: request.initiation_date.or(existing.initiation_date),
            photo_url: request
                .photo_url
                .as_ref()
                .map_or(existing.photo_url, |_| non_empty(&request.photo_url)),
            active: request.active.unwrap_or(existing.active),
            created_at: existing.created_at,
            updated_at: now(),
        };

        sqlx::query(
            "UPDATE brothers SET name = ?, cim = ?, degree = ?, email = ?, phone = ?, \
             birth_date = ?, initiation_date = ?, photo_url = ?, active = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&brother.name)
        .bind(&brother.cim)
        .bind(brother.degree.as_str())
        .bind(&brother.email)
        .bind(&brother.phone)
        .bind(brother.birth_date)
        .bind(brother.initiation_date)
        .bind(&brother.photo_url)
        .bind(brother.active)
        .bind(&brother.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(brother)
    }

    /// Delete a brother.
    pub async fn delete_brother(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM brothers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Brother {} not found", id)));
        }
        Ok(())
    }
}

pub(super) fn brother_from_row(row: &SqliteRow) -> Result<Brother, sqlx::Error> {
    Ok(Brother {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        cim: row.try_get("cim")?,
        degree: enum_column(row, "degree", Degree::parse)?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        birth_date: row.try_get("birth_date")?,
        initiation_date: row.try_get("initiation_date")?,
        photo_url: row.try_get("photo_url")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
