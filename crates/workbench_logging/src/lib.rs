//! Tracing setup for processes that embed the Workbench kernel.
//!
//! Logs go to stderr and to a size-rotated file under the Workbench data
//! directory. The filter honours `RUST_LOG` and otherwise falls back to
//! [`DEFAULT_LOG_FILTER`].

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "workbench_kernel=info,workbench_protocol=info";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// How much goes to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMode {
    /// Same filter as the log file
    Mirror,
    /// Warnings and errors only
    Quiet,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig<'a> {
    /// Base name of the log file (sanitized)
    pub app_name: &'a str,
    pub console: ConsoleMode,
    /// Overrides the default `<data dir>/workbench/logs` location
    pub log_dir: Option<PathBuf>,
}

impl<'a> LogConfig<'a> {
    pub fn new(app_name: &'a str) -> Self {
        Self {
            app_name,
            console: ConsoleMode::Mirror,
            log_dir: None,
        }
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => default_logs_dir()?,
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;

    let file_writer = SharedRollingWriter::new(&log_dir, config.app_name)
        .context("Failed to initialize rolling log writer")?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = match config.console {
        ConsoleMode::Mirror => file_filter.clone(),
        ConsoleMode::Quiet => EnvFilter::new("warn"),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

/// `<platform data dir>/workbench`
pub fn workbench_home() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("workbench"))
        .ok_or_else(|| anyhow!("Could not determine the platform data directory"))
}

/// `<platform data dir>/workbench/logs`
pub fn default_logs_dir() -> Result<PathBuf> {
    Ok(workbench_home()?.join("logs"))
}

/// Size-capped log file with numbered backups (`app.log.1` is newest).
struct RollingFile {
    dir: PathBuf,
    stem: String,
    keep: usize,
    limit: u64,
    file: Option<File>,
    written: u64,
}

impl RollingFile {
    fn open(dir: &Path, name: &str, keep: usize, limit: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut rolling = Self {
            dir: dir.to_path_buf(),
            stem: sanitize_name(name),
            keep: keep.max(1),
            limit,
            file: None,
            written: 0,
        };
        rolling.reopen()?;
        if rolling.written > rolling.limit {
            rolling.roll()?;
        }
        Ok(rolling)
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.stem))
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.stem, index))
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn roll(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let last = self.keep - 1;
        if last > 0 {
            let oldest = self.backup_path(last);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..last).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            let active = self.active_path();
            if active.exists() {
                fs::rename(active, self.backup_path(1))?;
            }
        } else {
            // Single-file mode: start over.
            let active = self.active_path();
            if active.exists() {
                fs::remove_file(active)?;
            }
        }

        self.reopen()
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written + buf.len() as u64 > self.limit {
            self.roll()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
struct SharedRollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl SharedRollingWriter {
    fn new(dir: &Path, name: &str) -> Result<Self> {
        let file = RollingFile::open(dir, name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file for {}", name))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }
}

struct SharedRollingWriterGuard {
    inner: Arc<Mutex<RollingFile>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = SharedRollingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedRollingWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedRollingWriterGuard {
    fn with_file<T>(&self, f: impl FnOnce(&mut RollingFile) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        f(&mut guard)
    }
}

impl Write for SharedRollingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("render worker/1"), "render_worker_1");
    }

    #[test]
    fn test_rolls_when_full() {
        let dir = tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "kernel", 3, 10).unwrap();
        file.write_all(b"0123456789").unwrap();
        file.write_all(b"abcdef").unwrap();
        file.flush().unwrap();

        let active = fs::read_to_string(dir.path().join("kernel.log")).unwrap();
        let backup = fs::read_to_string(dir.path().join("kernel.log.1")).unwrap();
        assert_eq!(active, "abcdef");
        assert_eq!(backup, "0123456789");
    }

    #[test]
    fn test_keeps_bounded_backups() {
        let dir = tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "kernel", 2, 4).unwrap();
        for chunk in [b"aaaa", b"bbbb", b"cccc"] {
            file.write_all(chunk).unwrap();
        }
        file.flush().unwrap();

        assert!(dir.path().join("kernel.log.1").exists());
        assert!(!dir.path().join("kernel.log.2").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("kernel.log")).unwrap(),
            "cccc"
        );
    }
}
