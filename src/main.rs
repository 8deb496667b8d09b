use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use covgate::actions::Runner;
use covgate::config::Cli;
use covgate::gate;
use covgate::github::Environment;

fn init_tracing() {
    // Step debug logging in Actions sets RUNNER_DEBUG=1.
    let default = if std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1") {
        "covgate=debug"
    } else {
        "covgate=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("COVGATE_LOG")
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let runner = Runner::from_env();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            runner.set_failed(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config.path, config.min_coverage, exclusions = config.exclusions.len(), "configured");

    match gate::run(&config, &runner, &Environment::from_env()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
