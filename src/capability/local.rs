//! Capabilities backed by files on the local file system.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use super::{FileCapability, WriteStream};
use crate::error::{IoOp, Result, SessionError};

/// A regular file the user picked.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    /// Check that `path` names a readable regular file and grant access to it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PlatformDenied`] when the path is missing,
    /// not a regular file, or not accessible.
    pub async fn resolve(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .await
            .map_err(|err| selection_error(path, err))?;
        if !metadata.is_file() {
            return Err(SessionError::PlatformDenied(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        // Opening for read surfaces permission problems now rather than at load.
        File::open(path)
            .await
            .map_err(|err| selection_error(path, err))?;
        // Keep the user's spelling if canonicalization fails (e.g. odd mounts).
        let path = fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn selection_error(path: &Path, err: io::Error) -> SessionError {
    match err.kind() {
        io::ErrorKind::NotFound => {
            SessionError::PlatformDenied(format!("{}: no such file", path.display()))
        }
        io::ErrorKind::PermissionDenied => {
            SessionError::PlatformDenied(format!("{}: permission denied", path.display()))
        }
        _ => SessionError::io(IoOp::Select, err),
    }
}

#[async_trait]
impl FileCapability for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|err| SessionError::io(IoOp::Read, err))
    }

    async fn open_writable(&self) -> Result<Box<dyn WriteStream>> {
        // No truncate: the file keeps its contents until the first save.
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(|err| SessionError::io(IoOp::Open, err))?;
        tracing::debug!(path = %self.path.display(), "opened write stream");
        Ok(Box::new(LocalWriteStream {
            path: self.path.clone(),
            file: Some(file),
        }))
    }
}

/// Write handle on a [`LocalFile`].
#[derive(Debug)]
pub struct LocalWriteStream {
    path: PathBuf,
    file: Option<File>,
}

impl LocalWriteStream {
    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

#[async_trait]
impl WriteStream for LocalWriteStream {
    async fn write(&mut self, text: &str) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(SessionError::stream_closed(IoOp::Write));
        };
        let io_err = |err: io::Error| SessionError::io(IoOp::Write, err);
        file.set_len(0).await.map_err(io_err)?;
        file.rewind().await.map_err(io_err)?;
        file.write_all(text.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "wrote file");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        let io_err = |err: io::Error| SessionError::io(IoOp::Close, err);
        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), "closed write stream");
        Ok(())
    }
}
