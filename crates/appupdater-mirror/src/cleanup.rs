use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use appupdater_core::UpdateLayout;
use tracing::{debug, info, warn};

/// Staging data could not be removed. Reported, never fatal.
#[derive(Debug)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub error: io::Error,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to clear staging path {}: {}",
            self.path.display(),
            self.error
        )
    }
}

/// Removes the staging tree and then the updates directory if it is empty.
pub fn cleanup_staging(layout: &UpdateLayout) -> Option<CleanupWarning> {
    let ready_dir = layout.ready_dir();
    info!(path = %ready_dir.display(), "fully clearing staging path");

    let warning = match fs::remove_dir_all(&ready_dir) {
        Ok(()) => None,
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(error) => {
            warn!(
                path = %ready_dir.display(),
                os_error = ?error.raw_os_error(),
                "failed to clear staging path: {error}"
            );
            Some(CleanupWarning {
                path: ready_dir,
                error,
            })
        }
    };

    // Other downloads may still live next to the staging tree.
    let updates_dir = layout.updates_dir();
    match fs::remove_dir(&updates_dir) {
        Ok(()) => {}
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty
            ) => {}
        Err(err) => debug!(
            path = %updates_dir.display(),
            os_error = ?err.raw_os_error(),
            "failed to remove updates dir: {err}"
        ),
    }
    warning
}
