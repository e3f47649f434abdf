use crate::error::RenameError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Filesystem operations the rename engine needs.
///
/// The executor and the recovery sweep only touch the filesystem through
/// this trait, so tests can inject failures without real locked files.
pub trait RenameFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// True when something (file, directory or dangling link) occupies `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl RenameFs for StdFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }
}

impl<T: RenameFs + ?Sized> RenameFs for &T {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// Whether an error is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to clear on its own: a lock, a sharing violation, a busy file
    Transient,
    Permanent,
}

/// Classify an I/O error from a rename attempt.
pub fn classify_io_error(err: &io::Error) -> ErrorClass {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return ErrorClass::Transient;
    }

    if let Some(code) = err.raw_os_error() {
        if classify_raw_os_error(code) == ErrorClass::Transient {
            return ErrorClass::Transient;
        }
    }

    classify_message(&err.to_string())
}

/// Classify a raw OS error code for the current platform.
#[cfg(windows)]
pub fn classify_raw_os_error(code: i32) -> ErrorClass {
    // ERROR_ACCESS_DENIED, ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    match code {
        5 | 32 | 33 => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Classify a raw OS error code for the current platform.
#[cfg(unix)]
pub fn classify_raw_os_error(code: i32) -> ErrorClass {
    match code {
        libc::EACCES | libc::EBUSY | libc::ETXTBSY => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Classify a raw OS error code for the current platform.
#[cfg(not(any(unix, windows)))]
pub fn classify_raw_os_error(_code: i32) -> ErrorClass {
    ErrorClass::Permanent
}

/// Classify by message text, for errors that only say what happened in prose.
pub fn classify_message(message: &str) -> ErrorClass {
    let message = message.to_lowercase();
    if message.contains("used by another process") || message.contains("being used") {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}

/// Bounded exponential backoff for transient rename failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further one
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries the same number of times without sleeping.
    pub fn without_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (0-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(1_u32.checked_shl(attempt).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX)
    }

    /// Every delay the policy can wait, in order.
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        (0..self.attempts().saturating_sub(1))
            .map(|attempt| self.delay_after(attempt))
            .collect()
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Rename `from` to `to`, retrying transient failures.
///
/// Returns the number of attempts used. Permanent errors return immediately
/// as [`RenameError::Io`]; transient errors that outlast the policy return
/// [`RenameError::RetriesExhausted`] carrying the last error.
pub fn rename_with_retry<F: RenameFs + ?Sized>(
    fs: &F,
    from: &Path,
    to: &Path,
    policy: &RetryPolicy,
) -> Result<u32, RenameError> {
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match fs.rename(from, to) {
            Ok(()) => return Ok(attempt + 1),
            Err(err) => {
                if classify_io_error(&err) == ErrorClass::Permanent {
                    return Err(RenameError::Io(err));
                }
                if attempt + 1 >= attempts {
                    return Err(RenameError::RetriesExhausted {
                        attempts,
                        source: err,
                    });
                }
                let delay = policy.delay_after(attempt);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                attempt += 1;
            },
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
