//! # samlconf
//!
//! Verifies a captured identity provider response against the SAML 2.0
//! HTTP-POST or HTTP-Redirect binding.

#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use samlconf_cli::{
    cli::Cli,
    output::{error, report_verified, report_violation},
    CliError,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let reported = match samlconf_cli::run(&cli) {
        Ok(verified) => report_verified(&verified, cli.format).map(|()| ExitCode::SUCCESS),
        Err(CliError::Violation(violation)) => {
            report_violation(&violation, cli.format).map(|()| ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    };

    reported.unwrap_or_else(|e| {
        error(&e.to_string());
        ExitCode::FAILURE
    })
}
