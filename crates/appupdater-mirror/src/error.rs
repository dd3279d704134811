use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions of one update attempt.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("failed to find update files in {}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "bad update: {} would overwrite the running updater {}",
        .source_path.display(),
        .dest_path.display()
    )]
    SelfOverwrite {
        source_path: PathBuf,
        dest_path: PathBuf,
    },
    #[error("failed to create directory {}", .path.display())]
    DirCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("update aborted: {} is not accessible", .dest_path.display())]
    CopyAborted {
        source_path: PathBuf,
        dest_path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UpdateError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Discovery { .. } => "discovery",
            Self::SelfOverwrite { .. } => "self-overwrite",
            Self::DirCreate { .. } => "dir-create",
            Self::CopyAborted { .. } => "copy-aborted",
        }
    }

    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            Self::Discovery { source, .. }
            | Self::DirCreate { source, .. }
            | Self::CopyAborted { source, .. } => source.raw_os_error(),
            Self::SelfOverwrite { .. } => None,
        }
    }
}
