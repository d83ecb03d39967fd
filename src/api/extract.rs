//! Request extractors whose rejections render as the error envelope.
//!
//! Thin wrappers over axum's own `Json`, `Query` and `Path`; a body or query
//! string that fails to deserialize becomes an [`AppError`] instead of
//! axum's plain-text rejection.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);
