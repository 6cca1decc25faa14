//! Installs the process-wide `tracing` subscriber.

use crate::errors::StartupError;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

/// Sends logs to stderr, or to a new `<n>.log` in `log_dir`.
///
/// Call once, before the server starts.
pub fn init(log_dir: Option<&Path>) -> Result<(), StartupError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match log_dir {
        Some(dir) => {
            let (path, file) = log_file_path(dir)
                .and_then(|path| File::create(&path).map(|file| (path, file)))
                .map_err(|source| StartupError::LogDestination {
                    path: dir.to_path_buf(),
                    source,
                })?;

            let installed = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
            tracing::info!(path = %path.display(), "logging to file");
            installed
        }
        None => builder.with_writer(io::stderr).try_init(),
    };

    installed.map_err(|err| StartupError::Subscriber(err.to_string()))
}

/// Log files are numbered by how many entries `dir` already holds.
pub(crate) fn log_file_path(dir: &Path) -> io::Result<PathBuf> {
    let count = fs::read_dir(dir)?.count();
    Ok(dir.join(format!("{count}.log")))
}
