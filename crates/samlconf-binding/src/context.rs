//! Inputs of a verification call.
//!
//! Both types are immutable snapshots: the HTTP client materializes an
//! [`HttpResponseView`] once, the test driver builds a [`RequestContext`] once,
//! and the verifiers only ever read them.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};

use crate::bindings::Binding;
use crate::constants::{DEFAULT_MAX_RELAY_STATE_BYTES, EXAMPLE_RELAY_STATE};

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpResponseView {
    /// HTTP status code.
    #[serde(alias = "status")]
    status_code: u16,

    /// Response headers in received order.
    #[serde(default)]
    headers: Vec<(String, String)>,

    /// Raw response body.
    #[serde(default, deserialize_with = "body_from_text")]
    body: Vec<u8>,
}

fn body_from_text<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(String::into_bytes)
}

impl HttpResponseView {
    /// Creates a response view.
    pub fn new(status_code: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            headers,
            body: body.into(),
        }
    }

    /// Creates a response with a status and body and no headers.
    pub fn with_body(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status_code, Vec::new(), body)
    }

    /// Returns a copy of this response with one more header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Returns the first header with the given name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Assertion Consumer Service URLs, one per binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcsUrls {
    /// ACS URL for the HTTP-POST binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,

    /// ACS URL for the HTTP-Redirect binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl AcsUrls {
    /// Returns the ACS URL configured for a binding.
    #[must_use]
    pub fn get(&self, binding: Binding) -> Option<&str> {
        match binding {
            Binding::Post => self.post.as_deref(),
            Binding::Redirect => self.redirect.as_deref(),
        }
    }
}

/// Per-test-case configuration supplied by the test driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Where the service provider expects responses, per binding.
    #[serde(default)]
    pub acs_urls: AcsUrls,

    /// Whether the request that triggered this response carried a relay state.
    #[serde(default)]
    pub relay_state_sent: bool,

    /// The relay state that was sent, which must be echoed back unchanged.
    #[serde(default = "default_expected_relay_state")]
    pub expected_relay_state: String,

    /// Upper bound on the relay state size in bytes.
    #[serde(default = "default_max_relay_state_bytes")]
    pub max_relay_state_bytes: usize,
}

fn default_expected_relay_state() -> String {
    EXAMPLE_RELAY_STATE.to_string()
}

const fn default_max_relay_state_bytes() -> usize {
    DEFAULT_MAX_RELAY_STATE_BYTES
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            acs_urls: AcsUrls::default(),
            relay_state_sent: false,
            expected_relay_state: default_expected_relay_state(),
            max_relay_state_bytes: default_max_relay_state_bytes(),
        }
    }
}

impl RequestContext {
    /// Creates a context for a request sent without relay state.
    pub fn new(acs_urls: AcsUrls) -> Self {
        Self {
            acs_urls,
            ..Self::default()
        }
    }

    /// Declares that the request carried `relay_state`.
    #[must_use]
    pub fn relay_state_sent(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state_sent = true;
        self.expected_relay_state = relay_state.into();
        self
    }

    /// Returns the ACS URL configured for a binding.
    #[must_use]
    pub fn acs_url(&self, binding: Binding) -> Option<&str> {
        self.acs_urls.get(binding)
    }
}
