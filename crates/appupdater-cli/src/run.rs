use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

use appupdater_core::{default_data_dir, IdentityError, SelfIdentity, UpdateLayout, UpdaterConfig};
use appupdater_metadata::{
    default_registry_root, update_installed_metadata, FileRegistry, MetadataOutcome,
};
use appupdater_mirror::{
    apply_staged_update_with_hooks, copy_file, CopyProgress, RetryPolicy, RunResult, UpdateReport,
};
use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::cli::Cli;
use crate::crash::{install_panic_hook, CrashContext};
use crate::logging::init_debug_log;
use crate::prompt::terminal_copy_decision;
use crate::relaunch::relaunch_application;
use crate::render::{TerminalProgress, TerminalRenderer};

/// Everything one helper run needs, resolved once from the flags and the
/// invocation path.
pub(crate) struct RunContext {
    pub(crate) cli: Cli,
    pub(crate) config: UpdaterConfig,
    pub(crate) layout: UpdateLayout,
    pub(crate) identity: Result<SelfIdentity, IdentityError>,
    pub(crate) renderer: TerminalRenderer,
}

pub(crate) fn run(cli: Cli, invocation: &str) {
    let context = RunContext::prepare(cli, invocation, TerminalRenderer::current());
    install_panic_hook(context.crash_context());

    if context.cli.update {
        context.apply_update();
    }
    context.relaunch();
}

impl RunContext {
    pub(crate) fn prepare(cli: Cli, invocation: &str, renderer: TerminalRenderer) -> Self {
        let work_dir = resolve_work_dir(&cli);
        let (config, config_error) =
            match UpdaterConfig::load_or_default(cli.config.as_deref(), &work_dir) {
                Ok(config) => (config, None),
                Err(err) => (UpdaterConfig::default(), Some(err)),
            };

        if cli.debug {
            match init_debug_log(&work_dir.join(&config.log_dir), Local::now()) {
                Ok(path) => info!(path = %path.display(), "debug log opened"),
                Err(err) => renderer.print_error(&format!("{err:#}")),
            }
        }
        info!(
            invocation,
            update = cli.update,
            autostart = cli.autostart,
            "updater started"
        );
        if let Some(err) = config_error {
            error!("{err:#}");
            renderer.print_error(&format!("{err:#}; using default settings"));
        }

        let identity = SelfIdentity::from_invocation(invocation, &config.helper_name);
        let install_root = match &identity {
            Ok(identity) => {
                info!(
                    install_root = %identity.install_root().display(),
                    "updater identity resolved"
                );
                identity.install_root().to_path_buf()
            }
            Err(err) => {
                error!("{err}");
                work_dir.clone()
            }
        };
        let layout = UpdateLayout::new(work_dir, install_root, &config);

        Self {
            cli,
            config,
            layout,
            identity,
            renderer,
        }
    }

    /// Runs the update when the invocation is trusted, then refreshes the
    /// installed metadata on success.
    pub(crate) fn apply_update(&self) -> Option<UpdateReport> {
        let identity = match &self.identity {
            Ok(identity) => identity,
            Err(err) => {
                self.renderer.print_error(&format!("update skipped: {err}"));
                return None;
            }
        };

        let policy = RetryPolicy::new(
            self.config.copy_attempts,
            Duration::from_millis(self.config.copy_retry_delay_ms),
        );
        let progress: RefCell<Option<TerminalProgress>> = RefCell::new(None);
        let report = apply_staged_update_with_hooks(
            &self.layout,
            identity,
            policy,
            copy_file,
            |failure| match progress.borrow().as_ref() {
                Some(progress) => progress.suspend(|| terminal_copy_decision(failure)),
                None => terminal_copy_decision(failure),
            },
            |event| match event {
                CopyProgress::Started { total } => {
                    *progress.borrow_mut() =
                        Some(self.renderer.start_progress("update", total as u64));
                }
                CopyProgress::FileCopied { copied, .. } => {
                    if let Some(progress) = progress.borrow_mut().as_mut() {
                        progress.set(copied as u64);
                    }
                }
            },
        );

        let progress = progress.into_inner();
        match &report.result {
            RunResult::NoUpdateStaged => debug!("no update staged"),
            RunResult::Succeeded => {
                if let Some(progress) = progress {
                    progress.finish_success();
                }
                self.renderer.print_status(
                    "ok",
                    &format!(
                        "update applied: {} files copied, {} directories created",
                        report.files_copied, report.dirs_created
                    ),
                );
            }
            RunResult::Failed(err) => {
                if let Some(progress) = progress {
                    progress.finish_abandon();
                }
                let message = match std::error::Error::source(err) {
                    Some(source) => format!("{err}: {source}"),
                    None => err.to_string(),
                };
                self.renderer.print_error(&message);
            }
        }
        if let Some(warning) = &report.cleanup_warning {
            self.renderer.print_status("warn", &warning.to_string());
        }

        if report.result.is_success() {
            self.update_metadata();
        }
        Some(report)
    }

    pub(crate) fn update_metadata(&self) -> Option<MetadataOutcome> {
        let registry_root = match self.registry_root() {
            Ok(root) => root,
            Err(err) => {
                warn!("skipping metadata update: {err:#}");
                return None;
            }
        };
        let registry = FileRegistry::new(registry_root);
        match update_installed_metadata(
            &registry,
            &self.layout,
            &self.config,
            Local::now().date_naive(),
        ) {
            Ok(outcome) => {
                debug!(?outcome, "metadata update finished");
                Some(outcome)
            }
            Err(err) => {
                warn!("failed to update installed metadata: {err:#}");
                None
            }
        }
    }

    pub(crate) fn relaunch(&self) {
        if let Err(err) = relaunch_application(&self.layout, self.cli.autostart, self.cli.debug) {
            error!("{err:#}");
            self.renderer.print_error(&format!("{err:#}"));
        }
    }

    pub(crate) fn crash_context(&self) -> CrashContext {
        let mut report_dirs = vec![self.layout.crash_report_dir()];
        if let Ok(data_dir) = default_data_dir(&self.config.product_name) {
            report_dirs.push(data_dir.join("tdumps"));
        }
        CrashContext {
            helper_name: self.config.helper_name.clone(),
            work_dir: self.layout.work_dir().to_path_buf(),
            install_root: self.layout.install_root().to_path_buf(),
            report_dirs,
        }
    }

    fn registry_root(&self) -> anyhow::Result<PathBuf> {
        match &self.config.registry_root {
            Some(root) => Ok(root.clone()),
            None => default_registry_root(&self.config.product_name),
        }
    }
}

fn resolve_work_dir(cli: &Cli) -> PathBuf {
    cli.work_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
