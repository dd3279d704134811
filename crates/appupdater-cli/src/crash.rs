use std::fs;
use std::panic;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CrashReport {
    pub(crate) helper: String,
    pub(crate) version: String,
    pub(crate) timestamp: String,
    pub(crate) pid: u32,
    pub(crate) message: String,
    pub(crate) location: Option<String>,
    pub(crate) work_dir: PathBuf,
    pub(crate) install_root: PathBuf,
}

/// Where a crash report may be written, in order of preference.
#[derive(Debug, Clone)]
pub(crate) struct CrashContext {
    pub(crate) helper_name: String,
    pub(crate) work_dir: PathBuf,
    pub(crate) install_root: PathBuf,
    pub(crate) report_dirs: Vec<PathBuf>,
}

/// Chains a hook that records the panic as JSON before the default hook runs.
pub(crate) fn install_panic_hook(context: CrashContext) {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = panic_info.location().map(|location| {
            format!("{}:{}:{}", location.file(), location.line(), location.column())
        });

        let report = build_crash_report(&context, Local::now(), message, location);
        match write_crash_report(&report, &context.report_dirs) {
            Ok(path) => eprintln!("crash report written to {}", path.display()),
            Err(err) => eprintln!("failed to write crash report: {err:#}"),
        }
        original_hook(panic_info);
    }));
}

pub(crate) fn build_crash_report(
    context: &CrashContext,
    now: DateTime<Local>,
    message: String,
    location: Option<String>,
) -> CrashReport {
    CrashReport {
        helper: helper_stem(&context.helper_name),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now.format("%Y%m%d_%H%M%S").to_string(),
        pid: std::process::id(),
        message,
        location,
        work_dir: context.work_dir.clone(),
        install_root: context.install_root.clone(),
    }
}

pub(crate) fn crash_report_file_name(report: &CrashReport) -> String {
    format!(
        "{}-{}-{}-{}.json",
        report.helper, report.version, report.timestamp, report.pid
    )
}

/// Writes the report into the first directory that accepts it.
pub(crate) fn write_crash_report(report: &CrashReport, dirs: &[PathBuf]) -> Result<PathBuf> {
    let payload =
        serde_json::to_vec_pretty(report).context("failed to serialize crash report")?;
    let mut last_error = None;
    for dir in dirs {
        match write_report_into(dir, &crash_report_file_name(report), &payload) {
            Ok(path) => return Ok(path),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("no crash report directory available")))
}

fn write_report_into(dir: &Path, file_name: &str, payload: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create crash report directory: {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, payload)
        .with_context(|| format!("failed to write crash report: {}", path.display()))?;
    Ok(path)
}

fn helper_stem(helper_name: &str) -> String {
    Path::new(helper_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| helper_name.to_string())
}
