//! SendGrid v3 mail send client.

use serde_json::json;

use super::{EmailSender, OutgoingEmail};
use crate::error::Result;

/// Default SendGrid API host.
pub const DEFAULT_SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

/// Client for `POST /v3/mail/send`.
#[derive(Clone)]
pub struct SendGridClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for SendGridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SendGridClient {
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_SENDGRID_BASE_URL, api_key)
    }

    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// v3 request body for a single-recipient HTML email.
    pub fn request_body(email: &OutgoingEmail) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": email.from },
            "subject": email.subject,
            "content": [{ "type": "text/html", "value": email.html_body }]
        })
    }
}

#[async_trait::async_trait]
impl EmailSender for SendGridClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let url = format!("{}/v3/mail/send", self.base_url.trim_end_matches('/'));

        let mut rb = self.http.post(&url).json(&Self::request_body(email));
        if let Some(k) = &self.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = crate::llm::check_status(rb.send().await?).await?;
        tracing::debug!(status = resp.status().as_u16(), "SendGrid accepted mail");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = SendGridClient::request_body(&OutgoingEmail {
            from: "kawsar@idare.ai".to_string(),
            to: "cto@example.com".to_string(),
            subject: "Predictive analytics, zero code".to_string(),
            html_body: "<p>Hi</p>".to_string(),
        });

        assert_eq!(body["personalizations"][0]["to"][0]["email"], "cto@example.com");
        assert_eq!(body["from"]["email"], "kawsar@idare.ai");
        assert_eq!(body["content"][0]["type"], "text/html");
        assert_eq!(body["content"][0]["value"], "<p>Hi</p>");
    }
}
