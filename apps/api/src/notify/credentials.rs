//! Encrypted on-disk cache for the mail API credentials.
//!
//! A 256-bit key is generated on first use and kept in an owner-only key file.
//! The token file holds `nonce || AES-256-GCM(ciphertext)` of the token JSON.
//! Token acquisition and refresh happen outside this service.

use std::io;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::files::{write_new, write_replace};

pub const SECRET_FILE_MODE: u32 = 0o600;
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no cached mail token; provision one via GMAIL_ACCESS_TOKEN")]
    Missing,

    #[error("cached mail token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("key file is not a valid 256-bit key")]
    InvalidKey,

    #[error("token cache could not be decrypted")]
    Decrypt,

    #[error("token cache could not be encrypted")]
    Encrypt,

    #[error("token cache contents are invalid: {0}")]
    Format(#[from] serde_json::Error),

    #[error("credential file I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct MailToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl MailToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

// Keeps the token itself out of logs.
impl std::fmt::Debug for MailToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialCache {
    key_path: PathBuf,
    token_path: PathBuf,
}

impl CredentialCache {
    pub fn new(key_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            token_path: token_path.into(),
        }
    }

    /// Encrypts and writes `token`, replacing any cached one.
    pub async fn store(&self, token: &MailToken) -> Result<(), CredentialError> {
        let cipher = self.cipher().await?;
        let plaintext = serde_json::to_vec(token)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|_| CredentialError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        write_replace(&self.token_path, &sealed, SECRET_FILE_MODE).await?;

        info!("Mail token cached at {}", self.token_path.display());
        Ok(())
    }

    /// Reads and decrypts the cached token.
    pub async fn load(&self) -> Result<MailToken, CredentialError> {
        let sealed = match tokio::fs::read(&self.token_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CredentialError::Missing),
            Err(e) => return Err(e.into()),
        };
        if sealed.len() <= NONCE_LEN {
            return Err(CredentialError::Decrypt);
        }

        let cipher = self.cipher().await?;
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialError::Decrypt)?;

        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// Loads the token and rejects it if it has expired.
    pub async fn load_valid(&self) -> Result<MailToken, CredentialError> {
        let token = self.load().await?;
        match token.expires_at {
            Some(expiry) if token.is_expired(Utc::now()) => Err(CredentialError::Expired(expiry)),
            _ => Ok(token),
        }
    }

    async fn cipher(&self) -> Result<Aes256Gcm, CredentialError> {
        let key = load_or_create_key(&self.key_path).await?;
        Aes256Gcm::new_from_slice(&key).map_err(|_| CredentialError::InvalidKey)
    }
}

async fn load_or_create_key(path: &Path) -> Result<Vec<u8>, CredentialError> {
    match tokio::fs::read_to_string(path).await {
        Ok(encoded) => STANDARD
            .decode(encoded.trim())
            .map_err(|_| CredentialError::InvalidKey),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let key = Aes256Gcm::generate_key(OsRng);
            let encoded = STANDARD.encode(key.as_slice());
            match write_new(path, encoded.as_bytes(), SECRET_FILE_MODE).await {
                Ok(()) => {
                    info!("Generated mail credential key at {}", path.display());
                    Ok(key.to_vec())
                }
                // Another process won the race; use its key.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let encoded = tokio::fs::read_to_string(path).await?;
                    STANDARD
                        .decode(encoded.trim())
                        .map_err(|_| CredentialError::InvalidKey)
                }
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cache(dir: &Path) -> CredentialCache {
        CredentialCache::new(dir.join(".gmail_key"), dir.join(".gmail_token.encrypted"))
    }

    fn token() -> MailToken {
        MailToken {
            access_token: "ya29.secret-token".to_string(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_store_then_load_returns_token() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());

        cache.store(&token()).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), token());
    }

    #[tokio::test]
    async fn test_token_file_is_not_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        cache.store(&token()).await.unwrap();

        let raw = std::fs::read(dir.path().join(".gmail_token.encrypted")).unwrap();
        let haystack = String::from_utf8_lossy(&raw);
        assert!(!haystack.contains("ya29.secret-token"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_key_and_token_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        cache(dir.path()).store(&token()).await.unwrap();

        for name in [".gmail_key", ".gmail_token.encrypted"] {
            let mode = std::fs::metadata(dir.path().join(name))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, SECRET_FILE_MODE, "{name}");
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            cache(dir.path()).load().await,
            Err(CredentialError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_different_key_cannot_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        cache(dir.path()).store(&token()).await.unwrap();

        std::fs::remove_file(dir.path().join(".gmail_key")).unwrap();
        assert!(matches!(
            cache(dir.path()).load().await,
            Err(CredentialError::Decrypt)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected_by_load_valid() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let expired = MailToken {
            expires_at: Some(Utc::now() - Duration::minutes(5)),
            ..token()
        };
        cache.store(&expired).await.unwrap();

        assert!(cache.load().await.is_ok());
        assert!(matches!(
            cache.load_valid().await,
            Err(CredentialError::Expired(_))
        ));
    }

    #[test]
    fn test_debug_redacts_access_token() {
        let rendered = format!("{:?}", token());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
