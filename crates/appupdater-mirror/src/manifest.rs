use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use appupdater_core::SelfIdentity;
use tracing::{debug, error, info};

use crate::UpdateError;

/// A directory that must exist under the install root before any copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub relative_path: PathBuf,
    pub dest_path: PathBuf,
}

/// A staged file and the live path it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
}

/// Validated plan derived from the staging tree, in breadth-first order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub dirs: Vec<DirEntry>,
    pub files: Vec<FileEntry>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

struct ListedEntry {
    name: OsString,
    is_dir: bool,
    is_link: bool,
}

/// Walks `staging_root` breadth-first and maps every entry under the
/// identity's install root.
///
/// Returns `Ok(None)` when `staging_root` does not exist: no update is staged.
/// A staged file whose destination is the running helper fails the whole
/// manifest with [`UpdateError::SelfOverwrite`].
pub fn build_manifest(
    staging_root: &Path,
    identity: &SelfIdentity,
) -> Result<Option<Manifest>, UpdateError> {
    let install_root = identity.install_root();
    let mut manifest = Manifest::default();
    let mut pending = VecDeque::from([(staging_root.to_path_buf(), PathBuf::new())]);
    // Canonical paths of listed directories; a linked directory pointing back
    // at one of them is not walked again.
    let mut visited = HashSet::new();

    while let Some((dir, relative)) = pending.pop_front() {
        let is_root = relative.as_os_str().is_empty();
        if !is_root {
            let dest_path = install_root.join(&relative);
            debug!(dir = %dest_path.display(), "parsing dir in update tree");
            manifest.dirs.push(DirEntry {
                relative_path: relative.clone(),
                dest_path,
            });
        }

        let entries = match list_dir_sorted(&dir) {
            Ok(entries) => entries,
            Err(err) if is_root && err.kind() == io::ErrorKind::NotFound => {
                info!(path = %dir.display(), "no update is ready");
                return Ok(None);
            }
            Err(source) => {
                error!(
                    path = %dir.display(),
                    os_error = ?source.raw_os_error(),
                    "failed to find update files: {source}"
                );
                return Err(UpdateError::Discovery { path: dir, source });
            }
        };

        if let Ok(canonical) = fs::canonicalize(&dir) {
            visited.insert(canonical);
        }

        for entry in entries {
            let source_path = dir.join(&entry.name);
            let child_relative = relative.join(&entry.name);
            if entry.is_dir {
                if entry.is_link
                    && fs::canonicalize(&source_path)
                        .is_ok_and(|canonical| visited.contains(&canonical))
                {
                    debug!(dir = %source_path.display(), "skipping linked dir that loops back");
                    continue;
                }
                debug!(dir = %source_path.display(), "added dir in update tree");
                pending.push_back((source_path, child_relative));
                continue;
            }

            let dest_path = install_root.join(&child_relative);
            if identity.is_self(&dest_path) {
                error!(
                    dest = %dest_path.display(),
                    executable = %identity.executable().display(),
                    "bad update, it would overwrite the updater itself"
                );
                return Err(UpdateError::SelfOverwrite {
                    source_path,
                    dest_path,
                });
            }

            debug!(
                source = %source_path.display(),
                dest = %dest_path.display(),
                "added file to be copied"
            );
            manifest.files.push(FileEntry {
                source_path,
                dest_path,
            });
        }
    }

    Ok(Some(manifest))
}

fn list_dir_sorted(dir: &Path) -> io::Result<Vec<ListedEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Linked directories are walked like real ones.
        let metadata = fs::metadata(entry.path())?;
        entries.push(ListedEntry {
            name: entry.file_name(),
            is_dir: metadata.is_dir(),
            is_link: entry.file_type()?.is_symlink(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
