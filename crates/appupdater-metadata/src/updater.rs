use std::path::Path;

use anyhow::Result;
use appupdater_core::{paths_equal_ignore_case, UpdateLayout, UpdaterConfig, VersionRecord};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::RegistryStore;

pub const INSTALL_LOCATION_VALUE: &str = "InstallLocation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOutcome {
    NoVersionRecord,
    KeyNotFound,
    InstallLocationMissing,
    Updated { version: String },
}

/// Publishes the installed version into the uninstall key so install and
/// uninstall UIs show it. Skips quietly when there is no usable version record,
/// no key, or no recorded install location.
pub fn update_installed_metadata<R>(
    store: &R,
    layout: &UpdateLayout,
    config: &UpdaterConfig,
    today: NaiveDate,
) -> Result<MetadataOutcome>
where
    R: RegistryStore + ?Sized,
{
    info!("updating registry");

    let Some(record) = VersionRecord::read_from(&layout.version_record_path())? else {
        debug!(path = %layout.version_record_path().display(), "no usable version record");
        return Ok(MetadataOutcome::NoVersionRecord);
    };
    info!(version = %record.version_string, "version file read");

    let Some(values) = store.read_key(&config.uninstall_key)? else {
        debug!(key = %config.uninstall_key, "uninstall key not found");
        return Ok(MetadataOutcome::KeyNotFound);
    };

    info!("checking registry install location");
    let Some(location) = values.get(INSTALL_LOCATION_VALUE) else {
        return Ok(MetadataOutcome::InstallLocationMissing);
    };
    // The location is only logged; metadata is written whenever the key is found.
    let matches = paths_equal_ignore_case(Path::new(location), layout.work_dir());
    debug!(location = %location, matches, "registry install location");

    let version = record.version_string;
    let updates = [
        ("DisplayVersion", version.clone()),
        (
            "DisplayName",
            format!("{} version {version}", config.product_name),
        ),
        ("Publisher", config.publisher.clone()),
        ("Inno Setup: Icon Group", config.product_name.clone()),
        ("InstallDate", today.format("%Y%m%d").to_string()),
        ("HelpLink", config.product_url.clone()),
        ("URLInfoAbout", config.product_url.clone()),
        ("URLUpdateInfo", config.product_url.clone()),
    ];
    store.write_values(&config.uninstall_key, &updates)?;
    info!(version = %version, "registry updated");

    Ok(MetadataOutcome::Updated { version })
}
