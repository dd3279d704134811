use super::*;
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use appupdater_core::{UpdateLayout, UpdaterConfig, VersionRecord};
use chrono::NaiveDate;

struct Fixture {
    root: PathBuf,
    layout: UpdateLayout,
    config: UpdaterConfig,
    registry: FileRegistry,
}

impl Fixture {
    fn new() -> Self {
        let root = test_root();
        let config = UpdaterConfig {
            product_name: "Beacon".to_string(),
            publisher: "Beacon Labs".to_string(),
            product_url: "https://beacon.example".to_string(),
            ..UpdaterConfig::default()
        };
        let layout = UpdateLayout::new(root.join("install"), root.join("install"), &config);
        fs::create_dir_all(layout.install_root()).expect("must create install dir");
        let registry = FileRegistry::new(root.join("registry"));
        Self {
            root,
            layout,
            config,
            registry,
        }
    }

    fn write_version(&self, version: u32, version_string: &str) {
        let path = self.layout.version_record_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("must create version dir");
        }
        let record = VersionRecord {
            version,
            version_string: version_string.to_string(),
        };
        fs::write(&path, record.encode().expect("must encode record"))
            .expect("must write version record");
    }

    fn seed_key(&self, install_location: Option<&str>) {
        let mut values = RegistryValues::new();
        values.insert("DisplayVersion".to_string(), "0.9.0".to_string());
        values.insert("UninstallString".to_string(), "unins000.exe".to_string());
        if let Some(location) = install_location {
            values.insert(INSTALL_LOCATION_VALUE.to_string(), location.to_string());
        }
        self.registry
            .create_key(&self.config.uninstall_key, &values)
            .expect("must seed uninstall key");
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 7).expect("valid date")
}

#[test]
fn writes_version_metadata_when_key_exists() {
    let fixture = Fixture::new();
    fixture.write_version(1_002_003, "1.2.3");
    fixture.seed_key(Some("/somewhere/else"));

    let outcome = update_installed_metadata(
        &fixture.registry,
        &fixture.layout,
        &fixture.config,
        today(),
    )
    .expect("must update metadata");
    assert_eq!(
        outcome,
        MetadataOutcome::Updated {
            version: "1.2.3".to_string()
        }
    );

    let values = fixture
        .registry
        .read_key(&fixture.config.uninstall_key)
        .expect("must read key")
        .expect("key exists");
    assert_eq!(values["DisplayVersion"], "1.2.3");
    assert_eq!(values["DisplayName"], "Beacon version 1.2.3");
    assert_eq!(values["Publisher"], "Beacon Labs");
    assert_eq!(values["Inno Setup: Icon Group"], "Beacon");
    assert_eq!(values["InstallDate"], "20260307");
    assert_eq!(values["HelpLink"], "https://beacon.example");
    assert_eq!(values["URLInfoAbout"], "https://beacon.example");
    assert_eq!(values["URLUpdateInfo"], "https://beacon.example");
    assert_eq!(values["UninstallString"], "unins000.exe");
    assert_eq!(values[INSTALL_LOCATION_VALUE], "/somewhere/else");
}

#[test]
fn skips_without_version_record() {
    let fixture = Fixture::new();
    fixture.seed_key(Some("/opt/app"));

    let outcome = update_installed_metadata(
        &fixture.registry,
        &fixture.layout,
        &fixture.config,
        today(),
    )
    .expect("must not fail");
    assert_eq!(outcome, MetadataOutcome::NoVersionRecord);

    let values = fixture
        .registry
        .read_key(&fixture.config.uninstall_key)
        .expect("must read key")
        .expect("key exists");
    assert_eq!(values["DisplayVersion"], "0.9.0");
}

#[test]
fn skips_zero_version_record() {
    let fixture = Fixture::new();
    fixture.write_version(0, "0.0.0");
    fixture.seed_key(Some("/opt/app"));

    let outcome = update_installed_metadata(
        &fixture.registry,
        &fixture.layout,
        &fixture.config,
        today(),
    )
    .expect("must not fail");
    assert_eq!(outcome, MetadataOutcome::NoVersionRecord);
}

#[test]
fn skips_when_key_is_missing() {
    let fixture = Fixture::new();
    fixture.write_version(3, "3.0");

    let outcome = update_installed_metadata(
        &fixture.registry,
        &fixture.layout,
        &fixture.config,
        today(),
    )
    .expect("must not fail");
    assert_eq!(outcome, MetadataOutcome::KeyNotFound);
    assert!(!fixture
        .registry
        .key_path(&fixture.config.uninstall_key)
        .expect("valid key")
        .exists());
}

#[test]
fn skips_when_install_location_is_missing() {
    let fixture = Fixture::new();
    fixture.write_version(3, "3.0");
    fixture.seed_key(None);

    let outcome = update_installed_metadata(
        &fixture.registry,
        &fixture.layout,
        &fixture.config,
        today(),
    )
    .expect("must not fail");
    assert_eq!(outcome, MetadataOutcome::InstallLocationMissing);
}

#[test]
fn file_registry_nests_key_segments() {
    let registry = FileRegistry::new("/reg");
    let path = registry
        .key_path("Software\\Vendor\\{ABC}_is1")
        .expect("valid key");
    assert_eq!(
        path,
        PathBuf::from("/reg")
            .join("Software")
            .join("Vendor")
            .join("{ABC}_is1.reg")
    );
}

#[test]
fn file_registry_rejects_escaping_segments() {
    let registry = FileRegistry::new("/reg");
    assert!(registry.key_path("Software\\..\\evil").is_err());
    assert!(registry.key_path("Software\\\\gap").is_err());
    assert!(registry.key_path("Software\\a/b").is_err());
}

#[test]
fn file_registry_write_requires_existing_key() {
    let fixture = Fixture::new();
    let err = fixture
        .registry
        .write_values("Software\\Missing", &[("DisplayVersion", "1".to_string())])
        .expect_err("writing to a missing key must fail");
    assert!(err.to_string().contains("registry key not found"));
}

#[test]
fn file_registry_rejects_multiline_values() {
    let fixture = Fixture::new();
    fixture.seed_key(Some("/opt/app"));
    let err = fixture
        .registry
        .write_values(
            &fixture.config.uninstall_key,
            &[("DisplayName", "two\nlines".to_string())],
        )
        .expect_err("newline must be rejected");
    assert!(err.to_string().contains("must not contain newlines"));
}

struct RecordingStore {
    values: Option<RegistryValues>,
    writes: RefCell<Vec<(String, String)>>,
}

impl RegistryStore for RecordingStore {
    fn read_key(&self, _key: &str) -> Result<Option<RegistryValues>> {
        Ok(self.values.clone())
    }

    fn write_values(&self, _key: &str, values: &[(&str, String)]) -> Result<()> {
        if self.values.is_none() {
            return Err(anyhow!("key missing"));
        }
        self.writes.borrow_mut().extend(
            values
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone())),
        );
        Ok(())
    }
}

#[test]
fn metadata_is_written_through_any_registry_store() {
    let fixture = Fixture::new();
    fixture.write_version(12, "12.0.1");
    let mut values = RegistryValues::new();
    values.insert(INSTALL_LOCATION_VALUE.to_string(), "C:\\Apps\\Beacon\\".to_string());
    let store = RecordingStore {
        values: Some(values),
        writes: RefCell::new(Vec::new()),
    };

    let outcome = update_installed_metadata(&store, &fixture.layout, &fixture.config, today())
        .expect("must update metadata");
    assert_eq!(
        outcome,
        MetadataOutcome::Updated {
            version: "12.0.1".to_string()
        }
    );
    let writes = store.writes.borrow();
    assert_eq!(writes.len(), 8);
    assert_eq!(writes[0], ("DisplayVersion".to_string(), "12.0.1".to_string()));
}

fn test_root() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "appupdater-metadata-tests-{}-{}",
        std::process::id(),
        nanos
    ));
    path
}
