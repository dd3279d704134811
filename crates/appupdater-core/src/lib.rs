mod config;
mod identity;
mod layout;
mod paths;
mod version_record;

pub use config::{UpdaterConfig, CONFIG_FILE_NAME};
pub use identity::{IdentityError, SelfIdentity};
pub use layout::{default_data_dir, UpdateLayout};
pub use paths::paths_equal_ignore_case;
pub use version_record::{VersionRecord, MAX_VERSION_STRING_BYTES};
