//! Transactional email delivery.
//!
//! [`send_html_email`] is the one entry point the agents use: it never fails,
//! it reports a [`SendStatus`] instead.

pub mod sendgrid;

pub use sendgrid::SendGridClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single HTML email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync + std::fmt::Debug {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Outcome of a send attempt, as reported back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SendStatus {
    Success,
    Error { message: String },
}

impl SendStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Send `email`, folding any failure into [`SendStatus::Error`].
pub async fn send_html_email(sender: &dyn EmailSender, email: &OutgoingEmail) -> SendStatus {
    match sender.send(email).await {
        Ok(()) => {
            tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
            SendStatus::Success
        }
        Err(e) => {
            tracing::error!(to = %email.to, error = %e, "Email send failed");
            SendStatus::Error {
                message: e.to_string(),
            }
        }
    }
}
