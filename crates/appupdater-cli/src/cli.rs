use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

/// Flags the application historically passed with a single dash.
const LEGACY_FLAGS: [&str; 3] = ["update", "autostart", "debug"];

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "updater", version)]
#[command(ignore_errors = true, args_override_self = true)]
#[command(about = "Applies a staged application update and relaunches the application", long_about = None)]
pub(crate) struct Cli {
    /// Apply the update staged under the work directory.
    #[arg(long)]
    pub(crate) update: bool,
    /// Forwarded to the relaunched application.
    #[arg(long)]
    pub(crate) autostart: bool,
    /// Write a debug log and forward the flag to the relaunched application.
    #[arg(long)]
    pub(crate) debug: bool,
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Directory holding the staging area and debug logs. Defaults to the
    /// current directory.
    #[arg(long)]
    pub(crate) work_dir: Option<PathBuf>,
}

/// Long options that take a value in the next argument.
const VALUE_OPTIONS: [&str; 2] = ["config", "work-dir"];

/// Long options the parser knows besides the boolean flags.
const OTHER_OPTIONS: [&str; 2] = ["help", "version"];

/// Rewrites `-update`, `-autostart` and `-debug` (any case) to their long
/// forms and drops every argument the parser does not know, so unknown
/// tokens from the application never cost the update. The first argument is
/// the invocation path and is left alone.
pub(crate) fn normalize_legacy_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut normalized = Vec::new();
    let mut expects_value = false;
    for (index, arg) in args.into_iter().enumerate() {
        if index == 0 || expects_value {
            expects_value = false;
            normalized.push(arg);
            continue;
        }
        if let Some(flag) = legacy_flag(&arg) {
            normalized.push(OsString::from(format!("--{flag}")));
            continue;
        }
        match known_long_option(&arg) {
            Some(KnownOption::Flag) => normalized.push(arg),
            Some(KnownOption::Value { inline }) => {
                expects_value = !inline;
                normalized.push(arg);
            }
            None if matches!(arg.to_str(), Some("-h" | "-V")) => normalized.push(arg),
            None => {}
        }
    }
    normalized
}

enum KnownOption {
    Flag,
    Value { inline: bool },
}

fn known_long_option(arg: &OsString) -> Option<KnownOption> {
    let raw = arg.to_str()?.strip_prefix("--")?;
    let (name, inline) = match raw.split_once('=') {
        Some((name, _)) => (name, true),
        None => (raw, false),
    };
    if VALUE_OPTIONS.contains(&name) {
        return Some(KnownOption::Value { inline });
    }
    if !inline && (LEGACY_FLAGS.contains(&name) || OTHER_OPTIONS.contains(&name)) {
        return Some(KnownOption::Flag);
    }
    None
}

fn legacy_flag(arg: &OsString) -> Option<&'static str> {
    let raw = arg.to_str()?;
    let name = raw.strip_prefix('-')?;
    if name.starts_with('-') {
        return None;
    }
    LEGACY_FLAGS
        .iter()
        .copied()
        .find(|flag| flag.eq_ignore_ascii_case(name))
}
