//! CLI configuration and response captures.

use std::path::{Path, PathBuf};

use samlconf_binding::{HttpResponseView, RequestContext};

use crate::{CliError, CliResult};

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "samlconf.toml";

/// Loads the test case configuration.
///
/// An explicit path must exist. Without one, `./samlconf.toml` is used if
/// present, else the defaults.
pub fn load_context(path: Option<&Path>) -> CliResult<RequestContext> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                tracing::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                return Ok(RequestContext::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| CliError::Config(format!("failed to read {}: {e}", path.display())))?;
    let context = toml::from_str(&content)
        .map_err(|e| CliError::Config(format!("failed to parse {}: {e}", path.display())))?;

    tracing::debug!(path = %path.display(), ?context, "loaded configuration");
    Ok(context)
}

/// Loads a captured HTTP response.
pub fn load_response(path: &Path) -> CliResult<HttpResponseView> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Capture(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use samlconf_binding::Binding;

    use super::*;

    #[test]
    fn load_context_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            relay_state_sent = true
            expected_relay_state = "abc"

            [acs_urls]
            redirect = "https://sp.example/acs"
            "#
        )
        .unwrap();

        let context = load_context(Some(file.path())).unwrap();
        assert!(context.relay_state_sent);
        assert_eq!(context.expected_relay_state, "abc");
        assert_eq!(context.max_relay_state_bytes, 80);
        assert_eq!(context.acs_url(Binding::Redirect), Some("https://sp.example/acs"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_context(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "relay_state_sent = \"maybe\"").unwrap();

        let err = load_context(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("configuration error"));
    }

    #[test]
    fn load_response_capture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"status": 302, "headers": [["Location", "https://sp.example/acs?SAMLResponse=abc"]]}}"#
        )
        .unwrap();

        let response = load_response(file.path()).unwrap();
        assert_eq!(response.status_code(), 302);
        assert_eq!(
            response.header("location"),
            Some("https://sp.example/acs?SAMLResponse=abc")
        );
        assert!(response.body().is_empty());
    }

    #[test]
    fn malformed_capture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            load_response(file.path()).unwrap_err(),
            CliError::Capture(_)
        ));
    }
}
