use std::path::{is_separator, Path, PathBuf};

use thiserror::Error;

use crate::paths_equal_ignore_case;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("short exe name: '{invocation}' cannot contain the helper name '{helper_name}'")]
    ShortName {
        invocation: String,
        helper_name: String,
    },
    #[error("bad exe name: '{invocation}' does not end with the helper name '{helper_name}'")]
    BadName {
        invocation: String,
        helper_name: String,
    },
}

/// Where the running helper lives. The install root is the directory part of
/// the invocation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfIdentity {
    executable: PathBuf,
    install_root: PathBuf,
}

impl SelfIdentity {
    /// Derives the identity from the invocation path (`argv[0]`). The path must
    /// be strictly longer than `helper_name` and end with a path separator
    /// followed by `helper_name`, compared case-insensitively.
    pub fn from_invocation(invocation: &str, helper_name: &str) -> Result<Self, IdentityError> {
        if invocation.len() <= helper_name.len() {
            return Err(IdentityError::ShortName {
                invocation: invocation.to_string(),
                helper_name: helper_name.to_string(),
            });
        }

        let split = invocation.len() - helper_name.len();
        let bad_name = || IdentityError::BadName {
            invocation: invocation.to_string(),
            helper_name: helper_name.to_string(),
        };
        let (dir, name) = match (invocation.get(..split), invocation.get(split..)) {
            (Some(dir), Some(name)) => (dir, name),
            _ => return Err(bad_name()),
        };
        if name.to_lowercase() != helper_name.to_lowercase() {
            return Err(bad_name());
        }
        if !dir.chars().last().is_some_and(is_separator) {
            return Err(bad_name());
        }

        Ok(Self {
            executable: PathBuf::from(invocation),
            install_root: PathBuf::from(dir),
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn is_self(&self, path: &Path) -> bool {
        paths_equal_ignore_case(path, &self.executable)
    }
}
