use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::{decode_all, enum_column, new_id, now, Repository};
use crate::errors::AppError;
use crate::models::{ArchiveReason, LodgePosition, LodgePositionHistory, PositionType};

const POSITION_SELECT: &str = "SELECT p.id, p.position_type, p.brother_id, b.name AS brother_name, \
     p.start_date, p.end_date, p.created_at \
     FROM lodge_positions p JOIN brothers b ON b.id = p.brother_id";

const HISTORY_COLUMNS: &str = "id, position_type, brother_id, brother_name, start_date, end_date, \
     archived_at, reason";

/// A new term to put in place.
#[derive(Debug, Clone)]
pub struct PositionAssignment {
    pub position_type: PositionType,
    pub brother_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Repository {
    // ==================== POSITION OPERATIONS ====================

    /// Current holders, in the fixed order of the roles.
    pub async fn list_positions(&self) -> Result<Vec<LodgePosition>, AppError> {
        let rows = sqlx::query(POSITION_SELECT).fetch_all(&self.pool).await?;
        let mut positions = decode_all(&rows, position_from_row)?;
        positions.sort_by_key(|p| {
            PositionType::ALL
                .iter()
                .position(|t| *t == p.position_type)
        });
        Ok(positions)
    }

    pub async fn get_position(
        &self,
        position_type: PositionType,
    ) -> Result<Option<LodgePosition>, AppError> {
        let row = sqlx::query(&format!("{} WHERE p.position_type = ?", POSITION_SELECT))
            .bind(position_type.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(position_from_row).transpose()?)
    }

    /// Archived terms, newest first.
    pub async fn list_position_history(
        &self,
        position_type: Option<PositionType>,
    ) -> Result<Vec<LodgePositionHistory>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM lodge_position_history \
             WHERE (?1 IS NULL OR position_type = ?1) \
             ORDER BY archived_at DESC, start_date DESC",
            HISTORY_COLUMNS
        ))
        .bind(position_type.map(|p| p.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, history_from_row)?)
    }

    /// Assign a brother to a position.
    ///
    /// The current holder, if any, is archived and removed in the same
    /// database transaction as the insert of the new holder, so a failure
    /// leaves the previous state untouched.
    pub async fn assign_position(
        &self,
        assignment: &PositionAssignment,
    ) -> Result<LodgePosition, AppError> {
        let mut tx = self.pool.begin().await?;

        let archived = archive_current_holder(
            &mut tx,
            assignment.position_type,
            ArchiveReason::Substituido,
        )
        .await?;

        let id = new_id();
        sqlx::query(
            "INSERT INTO lodge_positions \
             (id, position_type, brother_id, start_date, end_date, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(assignment.position_type.as_str())
        .bind(&assignment.brother_id)
        .bind(assignment.start_date)
        .bind(assignment.end_date)
        .bind(now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Some(previous) = archived {
            tracing::info!(
                "Position {} passed from {} to {}",
                assignment.position_type.as_str(),
                previous.brother_id,
                assignment.brother_id
            );
        }

        self.get_position(assignment.position_type)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Position {} vanished after insert", id)))
    }

    /// Vacate a position, moving its holder to history.
    pub async fn remove_position(
        &self,
        position_type: PositionType,
    ) -> Result<LodgePositionHistory, AppError> {
        let mut tx = self.pool.begin().await?;
        let archived =
            archive_current_holder(&mut tx, position_type, ArchiveReason::Removido).await?;
        tx.commit().await?;

        archived.ok_or_else(|| {
            AppError::NotFound(format!("Position {} is vacant", position_type.as_str()))
        })
    }
}

/// Copy the current holder of `position_type` into history and delete the
/// active row. Returns the history entry, or `None` when the role is vacant.
async fn archive_current_holder(
    conn: &mut SqliteConnection,
    position_type: PositionType,
    reason: ArchiveReason,
) -> Result<Option<LodgePositionHistory>, sqlx::Error> {
    let row = sqlx::query(&format!("{} WHERE p.position_type = ?", POSITION_SELECT))
        .bind(position_type.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    let Some(current) = row.as_ref().map(position_from_row).transpose()? else {
        return Ok(None);
    };

    let entry = LodgePositionHistory {
        id: new_id(),
        position_type: current.position_type,
        brother_id: current.brother_id,
        brother_name: current.brother_name,
        start_date: current.start_date,
        end_date: current.end_date,
        archived_at: now(),
        reason,
    };

    sqlx::query(&format!(
        "INSERT INTO lodge_position_history ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        HISTORY_COLUMNS
    ))
    .bind(&entry.id)
    .bind(entry.position_type.as_str())
    .bind(&entry.brother_id)
    .bind(&entry.brother_name)
    .bind(entry.start_date)
    .bind(entry.end_date)
    .bind(&entry.archived_at)
    .bind(entry.reason.as_str())
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM lodge_positions WHERE id = ?")
        .bind(&current.id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(entry))
}

fn position_from_row(row: &SqliteRow) -> Result<LodgePosition, sqlx::Error> {
    let position_type = enum_column(row, "position_type", PositionType::parse)?;
    Ok(LodgePosition {
        id: row.try_get("id")?,
        position_type,
        title: position_type.title().to_string(),
        brother_id: row.try_get("brother_id")?,
        brother_name: row.try_get("brother_name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<LodgePositionHistory, sqlx::Error> {
    Ok(LodgePositionHistory {
        id: row.try_get("id")?,
        position_type: enum_column(row, "position_type", PositionType::parse)?,
        brother_id: row.try_get("brother_id")?,
        brother_name: row.try_get("brother_name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        archived_at: row.try_get("archived_at")?,
        reason: enum_column(row, "reason", ArchiveReason::parse)?,
    })
}
