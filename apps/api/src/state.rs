use std::sync::Arc;

use crate::notify::DraftMailer;
use crate::repository::Repository;
use crate::screening::evaluation::Evaluator;
use crate::screening::ingest::UploadPolicy;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external collaborator is built once in `main` and handed in here.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    /// Pluggable resume evaluator. Default: LlmEvaluator.
    pub evaluator: Arc<dyn Evaluator>,
    /// Draft-only mail client. Default: GmailDrafter.
    pub mailer: Arc<dyn DraftMailer>,
    pub upload_policy: Arc<UploadPolicy>,
}
