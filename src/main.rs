use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod domain;
mod services;

use cli::{Cli, Commands};
use commands::{handle_print, handle_search, handle_verify};
use services::parser::parse_files;

const LOG_ENV: &str = "ISEARCH_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "isearch=debug" } else { "isearch=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Print { input, lineno } => {
            let doc = parse_files(&input.files)?;
            handle_print(&doc, cli.json, *lineno)
        }
        Commands::Search { input, search } => {
            let doc = parse_files(&input.files)?;
            handle_search(&doc, search, cli.json)
        }
        Commands::Verify { input, rules, gen } => {
            let doc = parse_files(&input.files)?;
            handle_verify(&doc, rules, *gen, cli.json)
        }
    }
}
