//! Notification dispatch: approval emails created as drafts in the HR mailbox.
//!
//! Nothing is sent to candidates from here; a human reviews and sends each draft.
//! Draft failures come back as a `NotificationOutcome`, never as an error.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub mod credentials;
pub mod gmail;
mod template;

pub use credentials::{CredentialCache, CredentialError, MailToken};
pub use gmail::GmailDrafter;
pub use template::approval_email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftReceipt {
    pub draft_id: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail credentials unavailable: {0}")]
    Credentials(#[from] CredentialError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid recipient address '{0}'")]
    InvalidRecipient(String),
}

/// Creates drafts in an HR mailbox. Implementations need compose-only access.
#[async_trait]
pub trait DraftMailer: Send + Sync {
    async fn create_draft(&self, email: &DraftEmail) -> Result<DraftReceipt, MailError>;
}

/// Result of the single draft attempt made for an eligible application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Drafted { draft_id: String },
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn is_drafted(&self) -> bool {
        matches!(self, NotificationOutcome::Drafted { .. })
    }
}

/// Drafts the approval email for a candidate. Makes exactly one attempt.
pub async fn dispatch_approval(
    mailer: &dyn DraftMailer,
    candidate_name: &str,
    candidate_email: &str,
    role: &str,
) -> NotificationOutcome {
    let email = approval_email(candidate_name, candidate_email, role);

    match mailer.create_draft(&email).await {
        Ok(receipt) => {
            info!("Approval draft {} created for {}", receipt.draft_id, email.to);
            NotificationOutcome::Drafted {
                draft_id: receipt.draft_id,
            }
        }
        Err(e) => {
            warn!("Error creating approval draft for {}: {e}", email.to);
            NotificationOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
