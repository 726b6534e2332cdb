use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::screening::ingest::{ResumeFormat, UploadPolicy, DEFAULT_MAX_UPLOAD_BYTES};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub enforce_resume_type: bool,
    pub allowed_resume_types: Vec<ResumeFormat>,
    pub company_name: String,
    pub llm_timeout: Duration,
    pub mail_timeout: Duration,
    pub gmail_key_file: PathBuf,
    pub gmail_token_file: PathBuf,
    pub gmail_access_token: Option<String>,
    pub hr_email: Option<String>,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            uploads_dir: PathBuf::from(env_or("UPLOADS_DIR", "uploads")),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            enforce_resume_type: parse_type_check(&env_or("RESUME_TYPE_CHECK", "enforce"))?,
            allowed_resume_types: parse_allowed_types(&env_or(
                "RESUME_ALLOWED_TYPES",
                "pdf,doc,docx",
            ))?,
            company_name: env_or("COMPANY_NAME", "Our Company"),
            llm_timeout: Duration::from_secs(
                parse_env("LLM_TIMEOUT_SECS", 120).context("LLM_TIMEOUT_SECS must be seconds")?,
            ),
            mail_timeout: Duration::from_secs(
                parse_env("MAIL_TIMEOUT_SECS", 30).context("MAIL_TIMEOUT_SECS must be seconds")?,
            ),
            gmail_key_file: PathBuf::from(env_or("GMAIL_KEY_FILE", ".gmail_key")),
            gmail_token_file: PathBuf::from(env_or("GMAIL_TOKEN_FILE", ".gmail_token.encrypted")),
            gmail_access_token: optional_env("GMAIL_ACCESS_TOKEN"),
            hr_email: optional_env("HR_EMAIL"),
            cors_allowed_origin: optional_env("CORS_ALLOWED_ORIGIN"),
        })
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            uploads_dir: self.uploads_dir.clone(),
            max_bytes: self.max_upload_bytes,
            enforce_type: self.enforce_resume_type,
            allowed: self.allowed_resume_types.clone(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}

fn parse_type_check(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "enforce" | "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => bail!("RESUME_TYPE_CHECK must be 'enforce' or 'off', got '{other}'"),
    }
}

fn parse_allowed_types(value: &str) -> Result<Vec<ResumeFormat>> {
    let mut allowed = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let format = entry
            .parse::<ResumeFormat>()
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("RESUME_ALLOWED_TYPES contains unknown type '{entry}'"))?;
        if !allowed.contains(&format) {
            allowed.push(format);
        }
    }
    if allowed.is_empty() {
        bail!("RESUME_ALLOWED_TYPES must list at least one type");
    }
    Ok(allowed)
}
