//! REST API module.
//!
//! Handlers validate input, call the repository and the pure calculation
//! modules, and wrap the result in the response envelope.

mod agenda;
mod brothers;
mod contact;
mod extract;
mod finance;
mod minutes;
mod positions;
mod reports;

pub use agenda::*;
pub use brothers::*;
pub use contact::*;
pub use finance::*;
pub use minutes::*;
pub use positions::*;
pub use reports::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::errors::AppError;

pub use extract::{Json, Path, Query};

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Reject blank required text fields.
fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Like [`require`], for optional fields of partial updates.
fn require_if_present(value: &Option<String>, field: &str) -> Result<(), AppError> {
    match value {
        Some(v) => require(v, field),
        None => Ok(()),
    }
}

fn not_found(what: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} {} not found", what, id))
}
