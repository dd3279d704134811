use std::fs;
use std::io;

use tracing::{debug, error, info};

use crate::{DirEntry, UpdateError};

/// Creates every manifest directory in order, parents first. An existing
/// directory is fine; a non-directory occupying the path is not.
///
/// Returns how many directories were newly created.
pub fn materialize_dirs(dirs: &[DirEntry]) -> Result<usize, UpdateError> {
    let mut created = 0;
    for dir in dirs {
        info!(dir = %dir.dest_path.display(), "forcing dir");
        match fs::create_dir(&dir.dest_path) {
            Ok(()) => created += 1,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && dir.dest_path.is_dir() => {
                debug!(dir = %dir.dest_path.display(), "already exists");
            }
            Err(source) => {
                error!(
                    dir = %dir.dest_path.display(),
                    os_error = ?source.raw_os_error(),
                    "failed to create dir: {source}"
                );
                return Err(UpdateError::DirCreate {
                    path: dir.dest_path.clone(),
                    source,
                });
            }
        }
    }
    Ok(created)
}
