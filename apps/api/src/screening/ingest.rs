//! Resume ingestion: upload validation and UUID-named storage under the uploads root.
//!
//! Validation runs before anything touches disk or the database, so a rejected
//! upload has no side effects.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::files::{ensure_dir, write_new};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const UPLOAD_DIR_MODE: u32 = 0o750;
pub const UPLOAD_FILE_MODE: u32 = 0o640;

/// Leading bytes inspected when sniffing content.
const SNIFF_WINDOW: usize = 1024;
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeFormat {
    Pdf,
    Doc,
    Docx,
    Text,
}

impl ResumeFormat {
    pub const DEFAULT_ALLOWED: [ResumeFormat; 3] =
        [ResumeFormat::Pdf, ResumeFormat::Doc, ResumeFormat::Docx];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(ResumeFormat::Pdf),
            "doc" => Some(ResumeFormat::Doc),
            "docx" => Some(ResumeFormat::Docx),
            "txt" => Some(ResumeFormat::Text),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(ResumeFormat::Pdf),
            "application/msword" => Some(ResumeFormat::Doc),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(ResumeFormat::Docx)
            }
            "text/plain" => Some(ResumeFormat::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Doc => "application/msword",
            ResumeFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ResumeFormat::Text => "text/plain",
        }
    }

    /// Checks the leading bytes against the format's signature.
    pub fn matches_content(&self, bytes: &[u8]) -> bool {
        match self {
            ResumeFormat::Pdf => bytes.starts_with(b"%PDF"),
            ResumeFormat::Doc => bytes.starts_with(&OLE_MAGIC),
            ResumeFormat::Docx => bytes.starts_with(&ZIP_MAGIC),
            ResumeFormat::Text => looks_like_text(bytes),
        }
    }
}

impl FromStr for ResumeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ResumeFormat::Text),
            other => ResumeFormat::from_extension(other)
                .ok_or_else(|| format!("unknown resume format '{other}'")),
        }
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    if window.contains(&0) {
        return false;
    }
    match std::str::from_utf8(window) {
        Ok(_) => true,
        // A multi-byte character cut off by the window is still text.
        Err(e) => e.error_len().is_none(),
    }
}

/// Upload rules applied to every resume. Type checking is an explicit switch,
/// never silently bypassed.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub uploads_dir: PathBuf,
    pub max_bytes: usize,
    pub enforce_type: bool,
    pub allowed: Vec<ResumeFormat>,
}

impl UploadPolicy {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            enforce_type: true,
            allowed: ResumeFormat::DEFAULT_ALLOWED.to_vec(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Resume exceeds the {limit}-byte upload limit")]
    Oversized { limit: usize },

    #[error("Resume file is empty")]
    Empty,

    #[error("Invalid file type: {0}")]
    InvalidType(String),

    #[error("Failed to store resume: {0}")]
    Io(#[from] io::Error),
}

/// Checks size and declared/actual type. Returns the detected format when known.
pub fn validate_upload(
    policy: &UploadPolicy,
    filename: &str,
    bytes: &[u8],
) -> Result<Option<ResumeFormat>, IngestError> {
    if bytes.len() > policy.max_bytes {
        return Err(IngestError::Oversized {
            limit: policy.max_bytes,
        });
    }
    if bytes.is_empty() {
        return Err(IngestError::Empty);
    }

    let declared = mime_guess::from_path(filename).first_raw();
    let format = declared.and_then(ResumeFormat::from_mime);

    if !policy.enforce_type {
        debug!("Type check disabled; accepting {filename} as {declared:?}");
        return Ok(format);
    }

    let format = match format {
        Some(format) if policy.allowed.contains(&format) => format,
        _ => {
            return Err(IngestError::InvalidType(format!(
                "'{}' is not an accepted resume type ({})",
                declared.unwrap_or("unknown"),
                allowed_list(&policy.allowed)
            )))
        }
    };

    if !format.matches_content(bytes) {
        return Err(IngestError::InvalidType(format!(
            "file content does not match its declared type {}",
            format.mime()
        )));
    }

    Ok(Some(format))
}

fn allowed_list(allowed: &[ResumeFormat]) -> String {
    allowed
        .iter()
        .map(|f| f.mime())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes the resume as `<uuid>.<ext>` under the uploads root.
pub async fn store_resume(
    policy: &UploadPolicy,
    filename: &str,
    bytes: &[u8],
) -> Result<PathBuf, IngestError> {
    ensure_dir(&policy.uploads_dir, UPLOAD_DIR_MODE).await?;

    let stored_name = match sanitize_extension(filename) {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    };
    let path = policy.uploads_dir.join(stored_name);
    write_new(&path, bytes, UPLOAD_FILE_MODE).await?;

    debug!("Stored resume at {}", path.display());
    Ok(path)
}

/// Best-effort removal of a stored resume after a failed submission.
pub async fn discard_resume(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove resume {}: {e}", path.display());
    }
}

fn sanitize_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
