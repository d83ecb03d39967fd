//! Outbound notifications for contact-form replies.
//!
//! Dispatch is best-effort. A missing endpoint, a transport error, a non-2xx
//! answer or a timeout is logged and otherwise ignored.

use std::time::Duration;

use serde::Serialize;

use crate::models::ContactMessage;

/// Payload posted to the mail relay.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplyEmail {
    pub to: String,
    pub name: String,
    pub subject: String,
    pub body: String,
}

impl ReplyEmail {
    /// Build the e-mail for a message that already carries its reply.
    pub fn for_message(message: &ContactMessage) -> Option<Self> {
        let reply = message.reply.as_deref()?;
        let subject = if message.subject.trim().is_empty() {
            "Resposta ao seu contato".to_string()
        } else {
            format!("Re: {}", message.subject.trim())
        };
        Some(Self {
            to: message.email.clone(),
            name: message.name.clone(),
            subject,
            body: reply.to_string(),
        })
    }
}

pub struct Notifier {
    client: reqwest::Client,
    url: Option<String>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(url: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url,
            timeout,
        }
    }

    /// Notifier that never sends anything.
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Send the reply e-mail for `message`. Returns whether the relay accepted it.
    pub async fn send_reply(&self, message: &ContactMessage) -> bool {
        let Some(url) = self.url.as_deref() else {
            tracing::debug!("No notification endpoint configured, skipping reply e-mail");
            return false;
        };
        let Some(email) = ReplyEmail::for_message(message) else {
            return false;
        };

        let request = self.client.post(url).json(&email).send();
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(resp)) if resp.status().is_success() => {
                tracing::info!("Reply e-mail for message {} dispatched", message.id);
                true
            }
            Ok(Ok(resp)) => {
                tracing::warn!(
                    "Reply e-mail for message {} rejected with status {}",
                    message.id,
                    resp.status()
                );
                false
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to dispatch reply e-mail for {}: {}", message.id, e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    "Reply e-mail for message {} timed out after {:?}",
                    message.id,
                    self.timeout
                );
                false
            }
        }
    }
}
