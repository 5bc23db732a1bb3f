mod cli;
mod config;
mod git;
mod marker;
mod mirror;
mod model;
mod notify;
mod prompt;
mod workflow;

use std::process;

use clap::Parser;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    cli::setup_logging(cli.verbose);

    match cli.run() {
        Ok(outcome) => {
            tracing::info!("run finished: {}", cli::format_outcome(&outcome));
            if outcome.is_failure() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
