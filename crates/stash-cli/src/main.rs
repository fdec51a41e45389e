#![allow(clippy::unused_async)]

use anyhow::Context;
use clap::Parser;

mod bootstrap;
mod cli;
mod commands;
mod context;
mod output;
mod progress;
mod ui;
mod write_lock;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("stash error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    if let cli::Commands::Schema(args) = &cli.command {
        return commands::schema::handle(args, &flags);
    }

    let config = bootstrap::load_config()?;
    let worker_lock = if command_requires_worker_lock(&cli.command) {
        Some(write_lock::acquire_worker_lock(&bootstrap::stash_dir(&config))?)
    } else {
        None
    };

    let ctx = context::AppContext::init(config)
        .await
        .context("failed to initialize stash")?;

    let result = commands::dispatch::dispatch(cli.command, &ctx, &flags).await;
    drop(worker_lock);
    result
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("STASH_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Only the commands that process captures need to be the single worker.
const fn command_requires_worker_lock(command: &cli::Commands) -> bool {
    matches!(command, cli::Commands::Process | cli::Commands::Watch)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::command_requires_worker_lock;
    use crate::cli::Cli;

    #[test]
    fn only_processing_commands_take_the_worker_lock() {
        for (args, expected) in [
            (vec!["stash", "process"], true),
            (vec!["stash", "watch"], true),
            (vec!["stash", "capture", "buy milk"], false),
            (vec!["stash", "review", "accept", "cap-1"], false),
            (vec!["stash", "task", "decompose", "tsk-1"], false),
        ] {
            let cli = Cli::try_parse_from(args.iter().copied()).expect("cli should parse");
            assert_eq!(command_requires_worker_lock(&cli.command), expected, "{args:?}");
        }
    }
}
