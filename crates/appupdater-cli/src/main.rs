mod cli;
mod crash;
mod logging;
mod prompt;
mod relaunch;
mod render;
mod run;

use clap::error::ErrorKind;
use clap::Parser;

use crate::cli::{normalize_legacy_args, Cli};

fn main() {
    let args = normalize_legacy_args(std::env::args_os());
    let invocation = args
        .first()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        // Unknown and repeated flags are ignored while parsing; anything else
        // still leads to a relaunch.
        Err(err) => {
            let _ = err.print();
            Cli::default()
        }
    };

    run::run(cli, &invocation);
}
