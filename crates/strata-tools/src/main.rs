//! `strata`: inspect glTF assets and run mesh selections from the command line.

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod error;
mod inspect;
mod select;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::initialize_tracing(&cli.log_filter, cli.log_format);

    let result = match &cli.command {
        Command::Inspect(args) => inspect::run(args),
        Command::Select(args) => select::run(args).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(%err, "command failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
