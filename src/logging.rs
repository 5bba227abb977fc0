//! Subscriber setup.
//!
//! The editor owns the terminal, so log lines never go to stdout or stderr:
//! they go to `--log-file` when one is given and are discarded otherwise.
//! Users see failures through toasts either way.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Discard,
}

impl LogTarget {
    pub fn from_flag(log_file: Option<&Path>) -> Self {
        log_file.map_or(Self::Discard, |path| Self::File(path.to_path_buf()))
    }

    /// Writer for the fmt layer. Creates (truncates) the log file.
    ///
    /// # Errors
    ///
    /// Fails when the log file cannot be created.
    pub fn make_writer(&self) -> Result<BoxMakeWriter> {
        match self {
            Self::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create log file {}", path.display()))?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
            Self::Discard => Ok(BoxMakeWriter::new(std::io::sink)),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when the log file cannot be created.
pub fn init(target: &LogTarget) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(target.make_writer()?)
        .init();
    Ok(())
}
