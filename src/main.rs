//! Quill - a minimal terminal text editor.
//!
//! # Usage
//!
//! ```bash
//! quill
//! quill --start-dir ~/notes
//! quill --debug --log-file quill.log
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use quill::app::App;
use quill::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use quill::logging::{self, LogTarget};

/// A minimal terminal text editor
#[derive(Parser, Debug)]
#[command(name = "quill", version, about, long_about = None)]
struct Cli {
    /// Use an in-memory file instead of the file system
    #[arg(long)]
    debug: bool,

    /// Directory the open-file prompt starts in
    #[arg(long, value_name = "DIR")]
    start_dir: Option<PathBuf>,

    /// Write logs to this file (otherwise they are discarded)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    logging::init(&LogTarget::from_flag(effective.log_file.as_deref()))?;
    tracing::info!(?effective, "starting");

    let start_dir = match effective.start_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("quill-session")
        .build()
        .context("Failed to start async runtime")?;

    let mut app = App::new(runtime.handle().clone())
        .with_debug(effective.debug)
        .with_start_dir(start_dir)
        .with_config_paths(
            Some(global_path),
            if local_path.exists() {
                Some(local_path)
            } else {
                None
            },
        );

    let result = app.run().context("Application error");
    runtime.shutdown_timeout(Duration::from_millis(250));
    result
}
