use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

const LOCK_FILE_NAME: &str = "imgseq.lock";
const STALE_LOCK_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Who holds a lock, as recorded in the lock file (`pid:timestamp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LockOwner {
    pid: u32,
    timestamp: u64,
}

impl LockOwner {
    fn current() -> Self {
        Self {
            pid: process::id(),
            timestamp: now_secs(),
        }
    }

    fn parse(content: &str) -> Option<Self> {
        let (pid, timestamp) = content.trim().split_once(':')?;
        Some(Self {
            pid: pid.parse().ok()?,
            timestamp: timestamp.parse().ok()?,
        })
    }

    fn is_stale(&self, now: u64) -> bool {
        now.saturating_sub(self.timestamp) > STALE_LOCK_TIMEOUT_SECS
    }

    fn render(&self) -> String {
        format!("{}:{}", self.pid, self.timestamp)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Exclusive claim on a directory for the duration of a batch.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    owner: LockOwner,
}

impl LockFile {
    /// Acquire the lock stored in `state_dir` (normally `<dir>/.imgseq`)
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        let lock_path = state_dir.join(LOCK_FILE_NAME);

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).context("Failed to read lock file")?;

            match LockOwner::parse(&content) {
                Some(owner) if owner.is_stale(now_secs()) => {
                    fs::remove_file(&lock_path).context("Failed to remove stale lock file")?;
                },
                Some(owner) if is_process_running(owner.pid) => {
                    return Err(anyhow!(
                        "Another imgseq process is already running in this directory (PID: {}). \
                        If this is incorrect, remove the lock file at: {}",
                        owner.pid,
                        lock_path.display()
                    ));
                },
                Some(_) => {
                    fs::remove_file(&lock_path).context("Failed to remove orphaned lock file")?;
                },
                None => {
                    return Err(anyhow!(
                        "Unreadable lock file at {}; remove it if no imgseq process is running",
                        lock_path.display()
                    ));
                },
            }
        }

        fs::create_dir_all(state_dir).context("Failed to create .imgseq directory")?;

        let owner = LockOwner::current();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true) // Fail if file exists (race condition protection)
            .open(&lock_path)
            .context("Failed to create lock file")?;

        file.write_all(owner.render().as_bytes())
            .context("Failed to write lock file")?;

        Ok(Self {
            path: lock_path,
            owner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock, leaving it alone if someone else has replaced it
    pub fn release(self) -> Result<()> {
        self.remove_if_owned()
    }

    fn remove_if_owned(&self) -> Result<()> {
        if self.path.exists() {
            let content = fs::read_to_string(&self.path).context("Failed to read lock file")?;
            if LockOwner::parse(&content) == Some(self.owner) {
                fs::remove_file(&self.path).context("Failed to remove lock file")?;
            }
        }
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = self.remove_if_owned();
    }
}

/// Check if a process with the given PID is running
#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    // Signal 0 only checks that the process exists
    #[allow(clippy::cast_possible_wrap)]
    unsafe {
        libc::kill(pid as libc::pid_t, 0) == 0
    }
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::OpenProcess;
    use winapi::um::winnt::PROCESS_QUERY_INFORMATION;

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_INFORMATION, 0, pid);
        if handle.is_null() {
            false
        } else {
            CloseHandle(handle);
            true
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn is_process_running(_pid: u32) -> bool {
    false
}
