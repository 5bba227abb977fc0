//! Host picker for the terminal app.
//!
//! [`PromptBroker::acquire`] posts a [`PickRequest`] to the UI and waits for
//! the user to type a path or dismiss the prompt. The wait is unbounded: the
//! user may take as long as they like.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{CapabilityBroker, FileCapability, LocalFile};
use crate::error::{Result, SessionError};

/// A pending file selection, answered exactly once by the UI.
#[derive(Debug)]
pub struct PickRequest {
    start_dir: PathBuf,
    reply: oneshot::Sender<Option<PathBuf>>,
}

impl PickRequest {
    /// Directory relative paths are resolved against.
    pub fn start_dir(&self) -> &Path {
        &self.start_dir
    }

    /// Answer with the path the user chose.
    pub fn choose(self, path: impl Into<PathBuf>) {
        // The broker may have been dropped mid-prompt; nobody is left to tell.
        let _ = self.reply.send(Some(path.into()));
    }

    /// Answer that the user dismissed the prompt.
    pub fn cancel(self) {
        let _ = self.reply.send(None);
    }
}

/// Broker that asks the UI for a path.
#[derive(Debug)]
pub struct PromptBroker {
    requests: mpsc::UnboundedSender<PickRequest>,
    start_dir: PathBuf,
}

impl PromptBroker {
    /// Create a broker and the receiving end the UI polls for requests.
    pub fn new(start_dir: impl Into<PathBuf>) -> (Self, mpsc::UnboundedReceiver<PickRequest>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (
            Self {
                requests,
                start_dir: start_dir.into(),
            },
            rx,
        )
    }

    fn resolve_path(&self, raw: &Path) -> PathBuf {
        let expanded = expand_home(raw);
        if expanded.is_relative() {
            self.start_dir.join(expanded)
        } else {
            expanded
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    std::env::var_os("HOME").map_or_else(|| path.to_path_buf(), |home| PathBuf::from(home).join(rest))
}

#[async_trait]
impl CapabilityBroker for PromptBroker {
    async fn acquire(&self) -> Result<Box<dyn FileCapability>> {
        let (reply, answer) = oneshot::channel();
        let request = PickRequest {
            start_dir: self.start_dir.clone(),
            reply,
        };
        if self.requests.send(request).is_err() {
            return Err(SessionError::PlatformDenied(
                "file picker is not available".to_string(),
            ));
        }

        match answer.await {
            Ok(Some(raw)) => {
                let file = LocalFile::resolve(self.resolve_path(&raw)).await?;
                tracing::info!(path = %file.path().display(), "file selected");
                Ok(Box::new(file))
            }
            Ok(None) => Err(SessionError::UserCancelled),
            Err(_) => Err(SessionError::PlatformDenied(
                "file picker closed".to_string(),
            )),
        }
    }
}
