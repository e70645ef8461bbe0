//! Rolling Logger
//!
//! Writes formatted `tracing` events (and `log` records, through the
//! subscriber's log bridge) to `<dir>/<app>.<YYYY-MM-DD>.log`, opening a new
//! file whenever the local date changes. The most recent lines are also kept
//! in memory so they can be surfaced without touching the filesystem.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::MakeWriter;

/// Lines kept in the circular buffer unless configured otherwise
pub const DEFAULT_BUFFER_LINES: usize = 500;

static GLOBAL: OnceLock<Arc<Mutex<RollingFile>>> = OnceLock::new();

/// Daily rotated log file with an in-memory tail
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    current_date: Option<String>,
    file: Option<File>,
    partial: String,
    recent: VecDeque<String>,
    capacity: usize,
}

impl RollingFile {
    pub fn open(dir: impl Into<PathBuf>, app_name: &str, capacity: usize) -> Result<Self, String> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| format!("Failed to create log dir: {}", e))?;
        Ok(Self {
            dir,
            app_name: app_name.to_string(),
            current_date: None,
            file: None,
            partial: String::new(),
            recent: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Path of the log file for a given date
    pub fn path_for(&self, date: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.log", self.app_name, date))
    }

    /// Append bytes under today's file
    pub fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        self.write_bytes_on(&today, buf)
    }

    /// Append bytes under the file for `date`, rotating first if needed
    pub fn write_bytes_on(&mut self, date: &str, buf: &[u8]) -> io::Result<()> {
        if self.current_date.as_deref() != Some(date) || self.file.is_none() {
            self.rotate(date)?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        self.remember(buf);
        Ok(())
    }

    /// Copy of the buffered lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.recent.iter().cloned().collect()
    }

    fn rotate(&mut self, date: &str) -> io::Result<()> {
        if let Some(mut old) = self.file.take() {
            old.flush()?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(date))?;
        self.file = Some(file);
        self.current_date = Some(date.to_string());
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']).to_string();
            if self.recent.len() == self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// `MakeWriter` handing out writers onto a shared `RollingFile`
#[derive(Clone)]
pub struct RollingMakeWriter {
    inner: Arc<Mutex<RollingFile>>,
}

pub struct RollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        guard.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingMakeWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter {
            inner: self.inner.clone(),
        }
    }
}

/// Handle returned by `init_logger`
#[derive(Clone)]
pub struct LoggerHandle {
    inner: Arc<Mutex<RollingFile>>,
}

impl LoggerHandle {
    pub fn recent_lines(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|file| file.recent_lines())
            .unwrap_or_default()
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.inner.lock().ok().map(|file| file.dir.clone())
    }
}

/// Install the global subscriber with the default buffer size
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<LoggerHandle, String> {
    init_logger_with_capacity(log_dir, app_name, DEFAULT_BUFFER_LINES)
}

/// Install the global subscriber.
///
/// Fails if a subscriber (ours or anyone else's) is already installed.
pub fn init_logger_with_capacity(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    capacity: usize,
) -> Result<LoggerHandle, String> {
    if GLOBAL.get().is_some() {
        return Err("Logger already initialized".to_string());
    }

    let rolling = RollingFile::open(log_dir.as_ref(), app_name, capacity)?;
    let inner = Arc::new(Mutex::new(rolling));

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(true)
        .with_writer(RollingMakeWriter { inner: inner.clone() })
        .try_init()
        .map_err(|e| format!("Failed to install subscriber: {}", e))?;

    GLOBAL
        .set(inner.clone())
        .map_err(|_| "Logger already initialized".to_string())?;

    Ok(LoggerHandle { inner })
}

/// Handle to the installed logger, if any
pub fn handle() -> Option<LoggerHandle> {
    GLOBAL.get().map(|inner| LoggerHandle { inner: inner.clone() })
}

/// Buffered lines of the installed logger (empty when not initialized)
pub fn recent_lines() -> Vec<String> {
    handle().map(|h| h.recent_lines()).unwrap_or_default()
}

fn ensure_initialized() -> Result<(), String> {
    if GLOBAL.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    Ok(())
}

pub fn info(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::error!("{}", msg);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_into_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "FlexList", 10).unwrap();

        file.write_bytes_on("2026-01-01", b"first line\n").unwrap();
        file.flush().unwrap();

        let content = fs::read_to_string(file.path_for("2026-01-01")).unwrap();
        assert_eq!(content, "first line\n");
    }

    #[test]
    fn test_rotates_when_date_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "FlexList", 10).unwrap();

        file.write_bytes_on("2026-01-01", b"day one\n").unwrap();
        file.write_bytes_on("2026-01-02", b"day two\n").unwrap();
        file.flush().unwrap();

        let one = fs::read_to_string(file.path_for("2026-01-01")).unwrap();
        let two = fs::read_to_string(file.path_for("2026-01-02")).unwrap();
        assert_eq!(one, "day one\n");
        assert_eq!(two, "day two\n");
    }

    #[test]
    fn test_buffer_keeps_most_recent_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "FlexList", 2).unwrap();

        file.write_bytes_on("2026-01-01", b"a\nb\n").unwrap();
        file.write_bytes_on("2026-01-01", b"c\n").unwrap();

        assert_eq!(file.recent_lines(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_partial_lines_are_joined() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "FlexList", 5).unwrap();

        file.write_bytes_on("2026-01-01", b"hel").unwrap();
        assert!(file.recent_lines().is_empty());
        file.write_bytes_on("2026-01-01", b"lo\n").unwrap();

        assert_eq!(file.recent_lines(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_global_logger_captures_log_records() {
        assert!(info("before init").is_err());

        let dir = tempfile::tempdir().unwrap();
        let handle = init_logger_with_capacity(dir.path(), "FlexList", 16).unwrap();
        log::info!("saved layout list_view:users.user");
        warn("tracing event").unwrap();

        let lines = handle.recent_lines();
        assert!(lines.iter().any(|l| l.contains("saved layout list_view:users.user")));
        assert!(lines.iter().any(|l| l.contains("tracing event")));
        assert!(init_logger(dir.path(), "FlexList").is_err());
    }
}
