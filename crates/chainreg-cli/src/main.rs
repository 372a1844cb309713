//! chainreg CLI: the `chainreg` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Some(jobs) = cli.jobs
        && let Err(error) = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
    {
        eprintln!("error: failed to configure {jobs} worker threads: {error}");
        std::process::exit(2);
    }

    match cli.command {
        Commands::Run {
            ignore_file,
            check,
            json,
            files,
        } => commands::run::run(cli.root, ignore_file, check, json, files),

        Commands::Propagate { check, json, files } => {
            commands::propagate::run(cli.root, check, json, files)
        }

        Commands::Sort { check, json, files } => commands::sort::run(cli.root, check, json, files),

        Commands::Validate {
            ignore_file,
            json,
            files,
        } => commands::validate::run(cli.root, ignore_file, json, files),
    }
}
