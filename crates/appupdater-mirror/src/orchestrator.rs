use std::io;
use std::path::Path;

use appupdater_core::{SelfIdentity, UpdateLayout};
use tracing::{error, info};

use crate::{
    build_manifest, cleanup_staging, copy_file, copy_with_retry, materialize_dirs,
    CleanupWarning, CopyDecision, CopyFailure, Manifest, RetryPolicy, UpdateError,
};

#[derive(Debug)]
pub enum RunResult {
    NoUpdateStaged,
    Succeeded,
    Failed(UpdateError),
}

impl RunResult {
    /// Both a finished update and "nothing staged" leave the install in its
    /// intended state.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::NoUpdateStaged | Self::Succeeded)
    }

    pub fn error(&self) -> Option<&UpdateError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct UpdateReport {
    pub result: RunResult,
    pub dirs_created: usize,
    pub files_copied: usize,
    pub cleanup_warning: Option<CleanupWarning>,
}

impl UpdateReport {
    fn no_update() -> Self {
        Self {
            result: RunResult::NoUpdateStaged,
            dirs_created: 0,
            files_copied: 0,
            cleanup_warning: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyProgress {
    Started { total: usize },
    FileCopied { copied: usize, total: usize },
}

pub fn apply_staged_update<Decide>(
    layout: &UpdateLayout,
    identity: &SelfIdentity,
    policy: RetryPolicy,
    decide: Decide,
) -> UpdateReport
where
    Decide: FnMut(&CopyFailure) -> CopyDecision,
{
    apply_staged_update_with_hooks(layout, identity, policy, copy_file, decide, |_| {})
}

/// Runs one update attempt: discover, materialize directories, copy files,
/// clean up.
///
/// The staging tree is removed exactly once on every path that found one,
/// whatever the outcome. Nothing is rolled back when copying fails partway.
pub fn apply_staged_update_with_hooks<CopyFile, Decide, Progress>(
    layout: &UpdateLayout,
    identity: &SelfIdentity,
    policy: RetryPolicy,
    mut copy: CopyFile,
    mut decide: Decide,
    mut progress: Progress,
) -> UpdateReport
where
    CopyFile: FnMut(&Path, &Path) -> io::Result<()>,
    Decide: FnMut(&CopyFailure) -> CopyDecision,
    Progress: FnMut(CopyProgress),
{
    info!("update started");
    let staging_root = layout.ready_dir();

    let mut dirs_created = 0;
    let mut files_copied = 0;
    let outcome = match build_manifest(&staging_root, identity) {
        Ok(None) => return UpdateReport::no_update(),
        Ok(Some(manifest)) => apply_manifest(
            &manifest,
            policy,
            &mut copy,
            &mut decide,
            &mut progress,
            &mut dirs_created,
            &mut files_copied,
        ),
        Err(err) => Err(err),
    };

    let result = match outcome {
        Ok(()) => {
            info!(dirs_created, files_copied, "update succeeded, clearing staging tree");
            RunResult::Succeeded
        }
        Err(err) => {
            error!(
                kind = err.kind(),
                os_error = ?err.os_error_code(),
                "update failed: {err}"
            );
            RunResult::Failed(err)
        }
    };

    UpdateReport {
        result,
        dirs_created,
        files_copied,
        cleanup_warning: cleanup_staging(layout),
    }
}

fn apply_manifest<CopyFile, Decide, Progress>(
    manifest: &Manifest,
    policy: RetryPolicy,
    copy: &mut CopyFile,
    decide: &mut Decide,
    progress: &mut Progress,
    dirs_created: &mut usize,
    files_copied: &mut usize,
) -> Result<(), UpdateError>
where
    CopyFile: FnMut(&Path, &Path) -> io::Result<()>,
    Decide: FnMut(&CopyFailure) -> CopyDecision,
    Progress: FnMut(CopyProgress),
{
    *dirs_created = materialize_dirs(&manifest.dirs)?;

    let total = manifest.files.len();
    progress(CopyProgress::Started { total });
    for entry in &manifest.files {
        copy_with_retry(entry, policy, &mut *copy, &mut *decide)?;
        *files_copied += 1;
        progress(CopyProgress::FileCopied {
            copied: *files_copied,
            total,
        });
    }
    Ok(())
}
