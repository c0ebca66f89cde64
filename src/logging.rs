//! Log setup: a size-rotating file plus standard output.
//!
//! The subscriber is built as a [`Dispatch`] so `main` can install it globally
//! while tests scope their own subscriber to a single test.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Size at which the log file is rolled over.
pub const MAX_LOG_BYTES: u64 = 3 * 1024 * 1024;

/// Number of rolled-over files kept next to the live log.
pub const LOG_BACKUPS: usize = 2;

/// File writer that rolls `run.log` to `run.log.1`, `run.log.1` to
/// `run.log.2` and so on once the next write would reach `max_bytes`.
pub struct RotatingFileAppender {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Mutex<RotatingState>,
}

struct RotatingState {
    file: File,
    written: u64,
}

impl RotatingFileAppender {
    /// Opens (or creates) the log file in append mode.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            backups,
            state: Mutex::new(RotatingState { file, written }),
        })
    }

    /// Path of the live log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`-th backup (`1` is the most recent).
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn lock(&self) -> MutexGuard<'_, RotatingState> {
        // A panic mid-write leaves the file usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rotate(&self, state: &mut RotatingState) -> io::Result<()> {
        state.file.flush()?;

        if self.backups == 0 {
            state.file = File::create(&self.path)?;
            state.written = 0;
            return Ok(());
        }

        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                std::fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        std::fs::rename(&self.path, self.backup_path(1))?;

        state.file = open_append(&self.path)?;
        state.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for &RotatingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        if state.written > 0 && state.written + buf.len() as u64 >= self.max_bytes {
            self.rotate(&mut state)?;
        }
        let n = state.file.write(buf)?;
        state.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileAppender {
    type Writer = &'a RotatingFileAppender;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

/// Builds the subscriber that writes to `log_file` and standard output.
///
/// The level defaults to INFO and can be adjusted through `RUST_LOG`.
pub fn dispatch(log_file: &Path) -> Result<Dispatch> {
    let appender = RotatingFileAppender::open(log_file, MAX_LOG_BYTES, LOG_BACKUPS)
        .map_err(|e| Error::Logging(format!("cannot open {}: {}", log_file.display(), e)))?;

    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(appender),
        );

    Ok(Dispatch::new(subscriber))
}

/// Installs the file + console subscriber for the rest of the process.
pub fn init(log_file: &Path) -> Result<()> {
    let dispatch = dispatch(log_file)?;
    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|e| Error::Logging(e.to_string()))
}
