//! Owner-restricted file and directory creation.
//!
//! Modes are applied explicitly after creation so the process umask cannot widen them.

use std::io;
use std::path::Path;

use tokio::io::AsyncWriteExt;

/// Creates `dir` (and parents) and sets its mode.
pub async fn ensure_dir(dir: &Path, mode: u32) -> io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(mode);
    builder.create(dir).await?;
    set_mode(dir, mode).await
}

/// Writes `bytes` to a new file at `path`, failing if it already exists.
pub async fn write_new(path: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(mode);
    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    set_mode(path, mode).await
}

/// Writes `bytes` to `path`, replacing any previous contents.
pub async fn write_replace(path: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);
    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    set_mode(path, mode).await
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
