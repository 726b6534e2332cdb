use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Column width for candidate name and email.
pub const MAX_CANDIDATE_FIELD_CHARS: usize = 255;

/// Lifecycle of an application. Rows are created `Pending` and moved at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub resume_path: String,
    pub evaluation_scores: Json<BTreeMap<String, f64>>,
    pub requirements_met: Json<BTreeMap<String, bool>>,
    pub total_score: f64,
    pub status: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    /// Parsed status; unknown strings are treated as pending.
    pub fn status(&self) -> ApplicationStatus {
        self.status.parse().unwrap_or(ApplicationStatus::Pending)
    }
}

/// An evaluated application about to be inserted with status `pending`.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub resume_path: String,
    pub evaluation_scores: BTreeMap<String, f64>,
    pub requirements_met: BTreeMap<String, bool>,
    pub total_score: f64,
    pub summary: Option<String>,
}

/// Trims and truncates a candidate-supplied field to the column width.
pub fn cap_field(value: &str) -> String {
    value.trim().chars().take(MAX_CANDIDATE_FIELD_CHARS).collect()
}
