//! Database repository for CRUD operations.
//!
//! Uses prepared statements, and transactions wherever a write spans several
//! statements. Row decoding is fallible: a malformed row surfaces as an
//! error instead of a half-filled struct.

mod agenda;
mod brothers;
mod contact;
mod finance;
mod minutes;
mod positions;

pub use positions::PositionAssignment;

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn decode_error(column: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    }
}

/// Read a decimal stored as text.
fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw)
        .map_err(|e| decode_error(column, format!("invalid decimal {:?}: {}", raw, e)))
}

/// Read a text column holding one of an enum's wire names.
fn enum_column<T>(
    row: &SqliteRow,
    column: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse(&raw).ok_or_else(|| decode_error(column, format!("unknown value {:?}", raw)))
}

fn decode_all<T>(
    rows: &[SqliteRow],
    decode: fn(&SqliteRow) -> Result<T, sqlx::Error>,
) -> Result<Vec<T>, sqlx::Error> {
    rows.iter().map(decode).collect()
}

/// Normalise money to cents before it is stored.
fn money(amount: Decimal) -> String {
    amount.round_dp(2).to_string()
}

/// Treat empty strings from form fields as absent.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
