//! # samlconf-cli
//!
//! Command-line harness for SAML binding compliance checks.
//!
//! Loads a captured identity provider response and a test case
//! configuration, runs one verification chain, and reports the verdict.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod output;

use samlconf_binding::verify::VerifiedResponse;
use samlconf_binding::{verify_rewritten, PassThrough};

pub use cli::Cli;
pub use error::{CliError, CliResult};

/// Verifies the captured response named on the command line.
pub fn run(cli: &Cli) -> CliResult<VerifiedResponse> {
    let context = config::load_context(cli.config.as_deref())?;
    let response = config::load_response(&cli.response)?;

    let verified = verify_rewritten(
        &PassThrough,
        cli.request_binding.into(),
        response,
        &context,
        cli.chain(),
    )?;
    Ok(verified)
}
