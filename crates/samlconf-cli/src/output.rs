//! Output formatting utilities.

use colored::Colorize;
use samlconf_binding::verify::VerifiedResponse;
use samlconf_binding::Violation;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Builds the JSON report of a verified response.
#[must_use]
pub fn verified_json(verified: &VerifiedResponse) -> Value {
    json!({
        "verified": true,
        "binding": verified.binding,
        "relay_state": verified.relay_state,
        "xml": verified.message.xml(),
    })
}

/// Builds the JSON report of a violation.
#[must_use]
pub fn violation_json(violation: &Violation) -> Value {
    json!({
        "verified": false,
        "kind": format!("{:?}", violation.kind()),
        "clauses": violation.clause_ids(),
        "sections": sections(violation),
        "message": violation.message(),
        "property": violation.property(),
        "actual": violation.actual(),
        "expected": violation.expected(),
        "cause": violation.cause().map(ToString::to_string),
        "node": violation.node(),
        "raw_body": violation.raw_body(),
    })
}

/// Returns the distinct section headings of the violated clauses, in order.
fn sections(violation: &Violation) -> Vec<&'static str> {
    let mut sections = Vec::new();
    for clause in violation.clauses() {
        let section = clause.section();
        if !sections.contains(&section) {
            sections.push(section);
        }
    }
    sections
}

/// Reports a verified response.
pub fn report_verified(verified: &VerifiedResponse, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Text => {
            success(&format!("{} response verified", verified.binding));
            if let Some(relay_state) = &verified.relay_state {
                println!("  {} {relay_state}", "RelayState:".bold());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&verified_json(verified))?);
        }
    }
    Ok(())
}

/// Reports a violation.
pub fn report_violation(violation: &Violation, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Text => {
            error(violation.message());
            println!("  {} {}", "Violated:".bold(), violation.clause_ids().join(", "));
            let sections = sections(violation);
            if !sections.is_empty() {
                println!("  {} {}", "Sections:".bold(), sections.join("; "));
            }
            if let Some(property) = violation.property() {
                println!(
                    "  {} {property}: actual {}, expected {}",
                    "Property:".bold(),
                    violation.actual().unwrap_or("null").yellow(),
                    violation.expected().unwrap_or("null").green()
                );
            }
            if let Some(cause) = violation.cause() {
                println!("  {} {cause}", "Cause:".bold());
            }
            if let Some(node) = violation.node() {
                println!("{}\n{node}", "Offending message:".bold());
            }
            if let Some(body) = violation.raw_body() {
                println!("{}\n{body}", "Response body:".bold());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&violation_json(violation))?);
        }
    }
    Ok(())
}
