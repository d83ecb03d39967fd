//! Contact-form and document API endpoints.

use axum::extract::State;
use serde::Deserialize;

use super::{not_found, require, require_if_present, success, ApiResult, Json, Path, Query};
use crate::errors::AppError;
use crate::models::{
    ContactFilter, ContactMessage, CreateContactMessageRequest, CreateDocumentRequest,
    DocumentFilter, LodgeDocument, ReplyContactMessageRequest, UpdateDocumentRequest,
};
use crate::AppState;

// ==================== CONTACT MESSAGES ====================

/// POST /api/contact - Public contact form. Not behind the API key.
pub async fn create_contact_message(
    State(state): State<AppState>,
    Json(request): Json<CreateContactMessageRequest>,
) -> ApiResult<ContactMessage> {
    require(&request.name, "Name")?;
    require(&request.email, "E-mail")?;
    require(&request.message, "Message")?;
    if !request.email.contains('@') {
        return Err(AppError::Validation("E-mail is not valid".to_string()));
    }

    let message = state.repo.create_contact_message(&request).await?;
    tracing::info!("Contact message {} received", message.id);
    success(message)
}

/// GET /api/contact/messages - Newest first; `?unread=true` for the inbox.
pub async fn list_contact_messages(
    State(state): State<AppState>,
    Query(filter): Query<ContactFilter>,
) -> ApiResult<Vec<ContactMessage>> {
    success(state.repo.list_contact_messages(&filter).await?)
}

/// GET /api/contact/messages/{id}
pub async fn get_contact_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ContactMessage> {
    match state.repo.get_contact_message(&id).await? {
        Some(message) => success(message),
        None => Err(not_found("Message", &id)),
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool {
    true
}

/// PUT /api/contact/messages/{id}/read
pub async fn mark_contact_message_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MarkReadRequest>,
) -> ApiResult<ContactMessage> {
    success(state.repo.mark_contact_message_read(&id, request.read).await?)
}

/// POST /api/contact/messages/{id}/reply
///
/// The reply is stored first. The e-mail to the sender is best-effort and
/// never changes the outcome.
pub async fn reply_contact_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReplyContactMessageRequest>,
) -> ApiResult<ContactMessage> {
    require(&request.reply, "Reply")?;

    let message = state.repo.reply_contact_message(&id, &request.reply).await?;
    state.notifier.send_reply(&message).await;
    success(message)
}

/// DELETE /api/contact/messages/{id}
pub async fn delete_contact_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_contact_message(&id).await?;
    success(())
}

// ==================== DOCUMENTS ====================

/// GET /api/documents - Optionally by `category`.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> ApiResult<Vec<LodgeDocument>> {
    success(state.repo.list_documents(&filter).await?)
}

/// GET /api/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<LodgeDocument> {
    match state.repo.get_document(&id).await? {
        Some(document) => success(document),
        None => Err(not_found("Document", &id)),
    }
}

/// POST /api/documents - Register a file already uploaded to storage.
pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> ApiResult<LodgeDocument> {
    require(&request.title, "Title")?;
    require(&request.file_url, "File URL")?;
    success(state.repo.create_document(&request).await?)
}

/// PUT /api/documents/{id}
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> ApiResult<LodgeDocument> {
    require_if_present(&request.title, "Title")?;
    require_if_present(&request.category, "Category")?;
    success(state.repo.update_document(&id, &request).await?)
}

/// DELETE /api/documents/{id} - Returns the removed row so the client can
/// drop the stored file.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<LodgeDocument> {
    success(state.repo.delete_document(&id).await?)
}
