//! Detached background processes that outlive a single `ql` invocation
//!
//! A session is tracked by a small JSON record in a per-user temp directory. The
//! record is the only link between the process that started a recording (or a
//! radio stream) and the later invocation that stops it. It tolerates crashes,
//! since a record whose process is gone is treated as stale, but two concurrent
//! starts of the same session overwrite each other's record and orphan the first
//! process.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tools::{self, ToolError};

const STOP_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0} is already running")]
    AlreadyRunning(String),
    #[error("{0} is not running")]
    NotRunning(String),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to signal pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

/// What is persisted about a running session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub pid: u32,
    pub label: String,
    #[serde(default)]
    pub output: Option<PathBuf>,
    pub started_at: i64,
}

/// Handle to a named background process
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    record_path: PathBuf,
}

impl Session {
    /// Session stored in the default per-user runtime directory
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::in_dir(name, &default_dir())
    }

    #[must_use]
    pub fn in_dir(name: &str, dir: &Path) -> Self {
        Self {
            name: name.to_string(),
            record_path: dir.join(format!("{name}.json")),
        }
    }

    #[must_use]
    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// The record of the running process, if any. Stale records are removed.
    #[must_use]
    pub fn current(&self) -> Option<SessionRecord> {
        let record = self.read_record()?;
        if process_alive(record.pid) {
            Some(record)
        } else {
            debug!(
                "Removing stale {} session record (pid {})",
                self.name, record.pid
            );
            let _ = std::fs::remove_file(&self.record_path);
            None
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current().is_some()
    }

    /// Start `program` detached and record it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyRunning` if the session is live, or an error
    /// if the program cannot be started or the record cannot be written.
    pub fn start(
        &self,
        program: &str,
        args: &[String],
        label: &str,
        output: Option<PathBuf>,
    ) -> Result<SessionRecord, SessionError> {
        if self.is_alive() {
            return Err(SessionError::AlreadyRunning(self.name.clone()));
        }
        let pid = tools::spawn_detached(program, args)?;
        let record = SessionRecord {
            pid,
            label: label.to_string(),
            output,
            started_at: chrono::Local::now().timestamp(),
        };
        self.write_record(&record)?;
        info!("Started {} session: {label} (pid {pid})", self.name);
        Ok(record)
    }

    /// Ask the process to stop: `SIGINT` first so recorders can finish their file,
    /// `SIGTERM` if it is still alive after a short wait.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` if there is no live process.
    pub fn stop(&self) -> Result<SessionRecord, SessionError> {
        let record = self
            .current()
            .ok_or_else(|| SessionError::NotRunning(self.name.clone()))?;
        send_signal(record.pid, libc::SIGINT)?;
        if !wait_for_exit(record.pid, STOP_TIMEOUT) {
            warn!(
                "{} session (pid {}) ignored SIGINT, sending SIGTERM",
                self.name, record.pid
            );
            send_signal(record.pid, libc::SIGTERM)?;
            wait_for_exit(record.pid, STOP_TIMEOUT);
        }
        let _ = std::fs::remove_file(&self.record_path);
        info!("Stopped {} session (pid {})", self.name, record.pid);
        Ok(record)
    }

    fn read_record(&self) -> Option<SessionRecord> {
        let contents = std::fs::read_to_string(&self.record_path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {e}",
                    self.record_path.display()
                );
                None
            }
        }
    }

    fn write_record(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.record_path.clone(),
            source,
        };
        if let Some(parent) = self.record_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| io_err(std::io::Error::other(e)))?;
        std::fs::write(&self.record_path, json).map_err(io_err)
    }
}

/// `$TMPDIR/ql-<uid>`
#[must_use]
pub fn default_dir() -> PathBuf {
    // SAFETY: getuid has no preconditions and cannot fail
    let uid = unsafe { libc::getuid() };
    std::env::temp_dir().join(format!("ql-{uid}"))
}

fn to_pid(pid: u32) -> Option<libc::pid_t> {
    libc::pid_t::try_from(pid).ok().filter(|&p| p > 0)
}

/// Whether a process with this pid exists
#[must_use]
pub fn process_alive(pid: u32) -> bool {
    let Some(pid) = to_pid(pid) else {
        return false;
    };
    // SAFETY: signal 0 only performs the existence and permission check
    let rc = unsafe { libc::kill(pid, 0) };
    let exists = rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM);
    exists && !is_zombie(pid)
}

/// An exited child that nobody reaped yet still answers `kill(pid, 0)`.
fn is_zombie(pid: libc::pid_t) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // The state follows the parenthesised command name, which may contain spaces
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state == "Z")
}

/// Send `signal` to `pid`.
///
/// # Errors
///
/// Returns `SessionError::Signal` if the signal could not be delivered.
pub fn send_signal(pid: u32, signal: libc::c_int) -> Result<(), SessionError> {
    let Some(raw) = to_pid(pid) else {
        return Err(SessionError::Signal {
            pid,
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        });
    };
    // SAFETY: kill(2) with a positive pid targets exactly one process
    if unsafe { libc::kill(raw, signal) } == 0 {
        Ok(())
    } else {
        Err(SessionError::Signal {
            pid,
            source: std::io::Error::last_os_error(),
        })
    }
}

fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_alive(pid) {
            return true;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    !process_alive(pid)
}
