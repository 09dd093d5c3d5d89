pub mod error;

pub use error::{GmailError, Result};

use base64::Engine;
use tracing::info;

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail API client for the outreach mailbox.
pub struct GmailClient {
    client: reqwest::Client,
    token: String,
}

impl GmailClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<()> {
        let resp = self
            .client
            .post(format!("{BASE_URL}/{endpoint}"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GmailError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    /// Create a draft in the mailbox without sending it.
    pub async fn create_draft(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        info!(recipient, subject, "Creating draft email");
        let raw = encode_message(recipient, subject, body);
        self.post("drafts", serde_json::json!({ "message": { "raw": raw } }))
            .await
    }

    /// Send a message immediately.
    pub async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        info!(recipient, subject, "Sending email");
        let raw = encode_message(recipient, subject, body);
        self.post("messages/send", serde_json::json!({ "raw": raw }))
            .await
    }
}

/// Build an RFC 2822 message and encode it the way the API expects
/// (URL-safe base64, no padding).
fn encode_message(recipient: &str, subject: &str, body: &str) -> String {
    let message = format!(
        "To: {recipient}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{body}"
    );
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_message_round_trips() {
        let raw = encode_message("jane@acme.com", "Hello", "A short note.");
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(raw)
            .unwrap();
        let text = String::from_utf8(decoded).unwrap();
        assert!(text.starts_with("To: jane@acme.com\r\n"));
        assert!(text.contains("Subject: Hello"));
        assert!(text.ends_with("\r\n\r\nA short note."));
    }
}
