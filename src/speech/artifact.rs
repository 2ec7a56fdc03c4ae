//! Fixed-path audio artifact

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Replace the artifact at `path` with `audio`
///
/// The bytes go to a temporary file in the same directory, which is then
/// renamed over the artifact, so a reader never observes a partial write.
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns error if the directory, temp file or rename fails
pub async fn write_artifact(path: &Path, audio: &[u8]) -> Result<()> {
    let path = path.to_path_buf();
    let audio = audio.to_vec();

    tokio::task::spawn_blocking(move || write_blocking(&path, &audio))
        .await
        .map_err(|e| Error::SynthesisFailed(format!("artifact writer panicked: {e}")))?
}

/// Read the artifact back
///
/// # Errors
///
/// Returns error if the file cannot be read
pub async fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(path).await?)
}

fn write_blocking(path: &Path, audio: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(audio)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = audio.len(), "wrote artifact");
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
