mod args;
mod parse_util;

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use args::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp(None)
        .init();

    // Printed directly so a RUST_LOG filter cannot swallow it.
    if let Err(e) = cli.run() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
