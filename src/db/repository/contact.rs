use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_all, new_id, non_empty, now, Repository};
use crate::errors::AppError;
use crate::models::{
    ContactFilter, ContactMessage, CreateContactMessageRequest, CreateDocumentRequest,
    DocumentFilter, LodgeDocument, UpdateDocumentRequest,
};

const MESSAGE_COLUMNS: &str =
    "id, name, email, phone, subject, message, read, reply, replied_at, created_at";

const DOCUMENT_COLUMNS: &str = "id, title, category, description, file_url, uploaded_at";

impl Repository {
    // ==================== CONTACT MESSAGE OPERATIONS ====================

    /// List messages, newest first.
    pub async fn list_contact_messages(
        &self,
        filter: &ContactFilter,
    ) -> Result<Vec<ContactMessage>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contact_messages WHERE (?1 IS NULL OR ?1 = 0 OR read = 0) \
             ORDER BY created_at DESC",
            MESSAGE_COLUMNS
        ))
        .bind(filter.unread)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, message_from_row)?)
    }

    pub async fn get_contact_message(&self, id: &str) -> Result<Option<ContactMessage>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contact_messages WHERE id = ?",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(message_from_row).transpose()?)
    }

    pub async fn create_contact_message(
        &self,
        request: &CreateContactMessageRequest,
    ) -> Result<ContactMessage, AppError> {
        let message = ContactMessage {
            id: new_id(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: non_empty(&request.phone),
            subject: request.subject.trim().to_string(),
            message: request.message.trim().to_string(),
            read: false,
            reply: None,
            replied_at: None,
            created_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO contact_messages ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            MESSAGE_COLUMNS
        ))
        .bind(&message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.phone)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.read)
        .bind(&message.reply)
        .bind(&message.replied_at)
        .bind(&message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn mark_contact_message_read(
        &self,
        id: &str,
        read: bool,
    ) -> Result<ContactMessage, AppError> {
        let result = sqlx::query("UPDATE contact_messages SET read = ? WHERE id = ?")
            .bind(read)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }

        self.get_contact_message(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message {} not found", id)))
    }

    /// Store a reply. Replying also marks the message as read.
    pub async fn reply_contact_message(
        &self,
        id: &str,
        reply: &str,
    ) -> Result<ContactMessage, AppError> {
        let result = sqlx::query(
            "UPDATE contact_messages SET reply = ?, replied_at = ?, read = 1 WHERE id = ?",
        )
        .bind(reply.trim())
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }

        self.get_contact_message(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message {} not found", id)))
    }

    pub async fn delete_contact_message(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }
        Ok(())
    }

    // ==================== DOCUMENT OPERATIONS ====================

    pub async fn list_documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<LodgeDocument>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM lodge_documents WHERE (?1 IS NULL OR category = ?1) \
             ORDER BY uploaded_at DESC",
            DOCUMENT_COLUMNS
        ))
        .bind(&filter.category)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, document_from_row)?)
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<LodgeDocument>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM lodge_documents WHERE id = ?",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(document_from_row).transpose()?)
    }

    pub async fn create_document(
        &self,
        request: &CreateDocumentRequest,
    ) -> Result<LodgeDocument, AppError> {
        let document = LodgeDocument {
            id: new_id(),
            title: request.title.trim().to_string(),
            category: request.category.trim().to_string(),
            description: non_empty(&request.description),
            file_url: request.file_url.trim().to_string(),
            uploaded_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO lodge_documents ({}) VALUES (?, ?, ?, ?, ?, ?)",
            DOCUMENT_COLUMNS
        ))
        .bind(&document.id)
        .bind(&document.title)
        .bind(&document.category)
        .bind(&document.description)
        .bind(&document.file_url)
        .bind(&document.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(document)
    }

    pub async fn update_document(
        &self,
        id: &str,
        request: &UpdateDocumentRequest,
    ) -> Result<LodgeDocument, AppError> {
        let existing = self
            .get_document(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        let document = LodgeDocument {
            title: request
                .title
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.title),
            category: request
                .category
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.category),
            description: request
                .description
                .as_ref()
                .map_or(existing.description, |_| non_empty(&request.description)),
            ..existing
        };

        sqlx::query(
            "UPDATE lodge_documents SET title = ?, category = ?, description = ? WHERE id = ?",
        )
        .bind(&document.title)
        .bind(&document.category)
        .bind(&document.description)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(document)
    }

    /// Delete the metadata row. The stored file is the caller's to remove.
    pub async fn delete_document(&self, id: &str) -> Result<LodgeDocument, AppError> {
        let document = self
            .get_document(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        sqlx::query("DELETE FROM lodge_documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(document)
    }
}

fn message_from_row(row: &SqliteRow) -> Result<ContactMessage, sqlx::Error> {
    Ok(ContactMessage {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        read: row.try_get("read")?,
        reply: row.try_get("reply")?,
        replied_at: row.try_get("replied_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn document_from_row(row: &SqliteRow) -> Result<LodgeDocument, sqlx::Error> {
    Ok(LodgeDocument {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        file_url: row.try_get("file_url")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}
