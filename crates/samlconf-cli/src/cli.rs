//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use samlconf_binding::{Binding, Chain};

/// samlconf - SAML 2.0 binding compliance checker.
///
/// Reads an identity provider response captured as JSON
/// (`{"status": 200, "headers": [["Location", "..."]], "body": "..."}`)
/// and verifies it against the HTTP-POST or HTTP-Redirect binding.
#[derive(Debug, Parser)]
#[command(name = "samlconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Test case configuration (TOML). Defaults to ./samlconf.toml if present.
    #[arg(short, long, env = "SAMLCONF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Captured HTTP response (JSON).
    #[arg(short, long, env = "SAMLCONF_RESPONSE")]
    pub response: PathBuf,

    /// Binding of the request that produced the response.
    #[arg(long, value_enum, default_value = "redirect")]
    pub request_binding: RequestBinding,

    /// Expect a SAML error response instead of a successful one.
    #[arg(long)]
    pub error_path: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Returns the verification chain selected by the flags.
    #[must_use]
    pub const fn chain(&self) -> Chain {
        if self.error_path {
            Chain::Error
        } else {
            Chain::Success
        }
    }
}

/// Request binding as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RequestBinding {
    /// HTTP-POST.
    Post,
    /// HTTP-Redirect.
    Redirect,
}

impl From<RequestBinding> for Binding {
    fn from(binding: RequestBinding) -> Self {
        match binding {
            RequestBinding::Post => Self::Post,
            RequestBinding::Redirect => Self::Redirect,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored report.
    #[default]
    Text,
    /// JSON report.
    Json,
}
