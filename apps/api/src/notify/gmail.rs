use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{CredentialCache, DraftEmail, DraftMailer, DraftReceipt, MailError};

const GMAIL_DRAFTS_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/drafts";
/// The only OAuth scope the cached token needs.
pub const GMAIL_COMPOSE_SCOPE: &str = "https://www.googleapis.com/auth/gmail.compose";

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GmailError {
    error: GmailErrorBody,
}

#[derive(Debug, Deserialize)]
struct GmailErrorBody {
    message: String,
}

/// Creates drafts in the authorised Gmail mailbox using a cached access token.
#[derive(Clone)]
pub struct GmailDrafter {
    client: Client,
    credentials: CredentialCache,
    from: Option<String>,
}

impl GmailDrafter {
    pub fn new(
        credentials: CredentialCache,
        from: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            credentials,
            from,
        })
    }
}

#[async_trait]
impl DraftMailer for GmailDrafter {
    async fn create_draft(&self, email: &DraftEmail) -> Result<DraftReceipt, MailError> {
        if !is_plausible_address(&email.to) {
            return Err(MailError::InvalidRecipient(email.to.clone()));
        }

        let token = self.credentials.load_valid().await?;
        let raw = URL_SAFE.encode(render_message(email, self.from.as_deref()));

        let response = self
            .client
            .post(GMAIL_DRAFTS_URL)
            .bearer_auth(&token.access_token)
            .json(&json!({ "message": { "raw": raw } }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GmailError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let draft: DraftResponse = response.json().await?;
        debug!("Gmail draft {} created", draft.id);
        Ok(DraftReceipt { draft_id: draft.id })
    }
}

/// Renders an RFC 2822 plain-text message.
fn render_message(email: &DraftEmail, from: Option<&str>) -> String {
    let mut message = String::new();
    if let Some(from) = from {
        message.push_str(&format!("From: {}\r\n", header_value(from)));
    }
    message.push_str(&format!("To: {}\r\n", header_value(&email.to)));
    message.push_str(&format!("Subject: {}\r\n", encode_subject(&email.subject)));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n");
    message.push_str("Content-Transfer-Encoding: 8bit\r\n");
    message.push_str("\r\n");
    message.push_str(&email.body.trim().replace("\r\n", "\n").replace('\n', "\r\n"));
    message
}

/// Strips line breaks so header values cannot inject extra headers.
fn header_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// RFC 2047 encodes non-ASCII subjects.
fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        subject
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

fn is_plausible_address(address: &str) -> bool {
    let address = address.trim();
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !address.chars().any(|c| c.is_whitespace() || c == ',')
        }
        None => false,
    }
}
