mod cleanup;
mod copier;
mod error;
mod manifest;
mod materialize;
mod orchestrator;

pub use cleanup::{cleanup_staging, CleanupWarning};
pub use copier::{copy_file, copy_with_retry, CopyDecision, CopyFailure, RetryPolicy};
pub use error::UpdateError;
pub use manifest::{build_manifest, DirEntry, FileEntry, Manifest};
pub use materialize::materialize_dirs;
pub use orchestrator::{
    apply_staged_update, apply_staged_update_with_hooks, CopyProgress, RunResult, UpdateReport,
};
