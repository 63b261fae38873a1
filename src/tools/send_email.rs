//! `send_html_email`: delivers the finished email to the configured recipient.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::Tool;
use crate::email::{EmailSender, OutgoingEmail, SendStatus, send_html_email};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct SendHtmlEmailArgs {
    subject: String,
    html_body: String,
}

/// Sends an HTML email to the fixed prospect address.
#[derive(Debug)]
pub struct SendHtmlEmailTool {
    sender: Arc<dyn EmailSender>,
    from: String,
    to: String,
}

impl SendHtmlEmailTool {
    pub fn new(sender: Arc<dyn EmailSender>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            sender,
            from: from.into(),
            to: to.into(),
        }
    }
}

#[async_trait]
impl Tool for SendHtmlEmailTool {
    fn name(&self) -> &str {
        "send_html_email"
    }

    fn description(&self) -> &str {
        "Send out an email with the given subject and HTML body to all sales prospects"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "subject": { "type": "string", "description": "Email subject line." },
                "html_body": { "type": "string", "description": "HTML email body." }
            },
            "required": ["subject", "html_body"],
            "additionalProperties": false
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        // Bad arguments are reported like a failed send.
        let status = match serde_json::from_value::<SendHtmlEmailArgs>(args) {
            Ok(args) => {
                let email = OutgoingEmail {
                    from: self.from.clone(),
                    to: self.to.clone(),
                    subject: args.subject,
                    html_body: args.html_body,
                };
                send_html_email(self.sender.as_ref(), &email).await
            }
            Err(e) => SendStatus::Error {
                message: e.to_string(),
            },
        };
        Ok(serde_json::to_value(status)?)
    }
}
