mod registry;
mod updater;

pub use registry::{default_registry_root, FileRegistry, RegistryStore, RegistryValues};
pub use updater::{update_installed_metadata, MetadataOutcome, INSTALL_LOCATION_VALUE};

#[cfg(test)]
mod tests;
