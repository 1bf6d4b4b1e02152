mod cli;
mod error;
mod output;
mod plan;
mod runner;
mod source;

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::Renderer;
use crate::runner::RunOptions;
use crate::source::ServicePrincipal;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = azmon_config::load_settings(cli.config.as_deref())?;

    let lookback = match cli.lookback {
        Some(lookback) => lookback,
        None => settings.lookback()?,
    };
    let limit = cli.limit.unwrap_or(settings.display_limit);
    let renderer = Renderer::new(cli.output, output::should_color(cli.color), limit);
    let authenticator = ServicePrincipal::new(settings.endpoints()?, settings.transport());

    let options = RunOptions {
        resource_id: cli.resource_id,
        now: chrono::Utc::now(),
        lookback,
    };
    tracing::debug!(resource = %options.resource_id, limit, ?lookback, "starting run");

    let mut stdout = io::stdout().lock();
    runner::run(
        azmon_config::env_lookup,
        &authenticator,
        &options,
        &renderer,
        &mut stdout,
    )
    .await
}
