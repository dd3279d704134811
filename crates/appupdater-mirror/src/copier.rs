use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{FileEntry, UpdateError};

/// Bounded local retry applied to every file copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// A file that failed every attempt of one bounded retry sequence.
#[derive(Debug)]
pub struct CopyFailure {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub attempts: u32,
    pub error: io::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDecision {
    Retry,
    Abort,
}

pub fn copy_file(source: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(source, dest).map(|_| ())
}

/// Copies one manifest file, overwriting the destination.
///
/// Each failure sleeps `policy.delay` before the next attempt. When all
/// `policy.attempts` fail, `decide` chooses between running the whole bounded
/// sequence again and aborting the update.
pub fn copy_with_retry<CopyFile, Decide>(
    entry: &FileEntry,
    policy: RetryPolicy,
    mut copy: CopyFile,
    mut decide: Decide,
) -> Result<(), UpdateError>
where
    CopyFile: FnMut(&Path, &Path) -> io::Result<()>,
    Decide: FnMut(&CopyFailure) -> CopyDecision,
{
    loop {
        info!(
            source = %entry.source_path.display(),
            dest = %entry.dest_path.display(),
            "copying file"
        );
        let error = match copy_bounded(entry, policy, &mut copy) {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        warn!(
            dest = %entry.dest_path.display(),
            attempts = policy.attempts,
            os_error = ?error.raw_os_error(),
            "failed to copy, asking to retry: {error}"
        );
        let failure = CopyFailure {
            source_path: entry.source_path.clone(),
            dest_path: entry.dest_path.clone(),
            attempts: policy.attempts,
            error,
        };

        match decide(&failure) {
            CopyDecision::Retry => info!(dest = %entry.dest_path.display(), "retrying copy"),
            CopyDecision::Abort => {
                warn!(dest = %entry.dest_path.display(), "copy aborted by operator");
                return Err(UpdateError::CopyAborted {
                    source_path: failure.source_path,
                    dest_path: failure.dest_path,
                    source: failure.error,
                });
            }
        }
    }
}

fn copy_bounded<CopyFile>(
    entry: &FileEntry,
    policy: RetryPolicy,
    copy: &mut CopyFile,
) -> io::Result<()>
where
    CopyFile: FnMut(&Path, &Path) -> io::Result<()>,
{
    let mut last_error = None;
    for attempt in 1..=policy.attempts.max(1) {
        match copy(&entry.source_path, &entry.dest_path) {
            Ok(()) => {
                if attempt > 1 {
                    debug!(attempt, dest = %entry.dest_path.display(), "copy succeeded after retry");
                }
                return Ok(());
            }
            Err(err) => {
                debug!(attempt, dest = %entry.dest_path.display(), "copy attempt failed: {err}");
                last_error = Some(err);
                thread::sleep(policy.delay);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| io::Error::other("no copy attempt was made")))
}
