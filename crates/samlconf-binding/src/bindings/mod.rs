//! SAML bindings: classification, extraction and decoding.
//!
//! This module reverses the two SAML 2.0 bindings an identity provider may use
//! to deliver a response to the service provider:
//!
//! - **HTTP-POST Binding** - the message is base64-encoded into a hidden
//!   control of an auto-submitting HTML form
//! - **HTTP-Redirect Binding** - the message is deflated, base64-encoded and
//!   URL-encoded into the query string of the `Location` header
//!
//! # Usage
//!
//! ```rust,ignore
//! use samlconf_binding::bindings::{classify, Binding, HttpPostBinding, HttpRedirectBinding};
//!
//! let extracted = match classify(&response)? {
//!     Binding::Post => HttpPostBinding::extract(&response),
//!     Binding::Redirect => HttpRedirectBinding::extract(&response),
//! };
//! ```

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{LOCATION, SAML_RESPONSE};
use crate::context::HttpResponseView;
use crate::dom::{DomBuilder, ParseError, XmlDocument};
use crate::violation::{Violation, ViolationKind, VerifyResult};

/// The SAML bindings a response can be delivered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// HTTP POST binding.
    Post,
    /// HTTP Redirect binding.
    Redirect,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => f.write_str("HTTP-POST"),
            Self::Redirect => f.write_str("HTTP-Redirect"),
        }
    }
}

/// Determines which binding a response uses.
///
/// A form carrying a `SAMLResponse` control wins over a `Location` header
/// carrying `SAMLResponse=`, so a response showing both is always POST.
pub fn classify(response: &HttpResponseView) -> VerifyResult<Binding> {
    let body = response.body_text();
    if let Ok(page) = DomBuilder::parse_html(&body) {
        if find_response_form(&page).is_some() {
            tracing::trace!(binding = %Binding::Post, "classified response");
            return Ok(Binding::Post);
        }
    }

    let in_location = response
        .header(LOCATION)
        .map(redirect::raw_query)
        .is_some_and(|query| query.contains(&format!("{SAML_RESPONSE}=")));
    if in_location {
        tracing::trace!(binding = %Binding::Redirect, "classified response");
        return Ok(Binding::Redirect);
    }

    tracing::debug!(body = %body, "no SAML binding found in response");
    Err(Violation::new(
        ViolationKind::UnsupportedBinding,
        &[],
        "Binding is not currently supported. Expected an HTML form with a SAMLResponse \
         control or a Location header carrying a SAMLResponse query parameter.",
    )
    .with_raw_body(body.into_owned()))
}

/// The encoded message and its carrier, as found in a response.
///
/// Absence of any item is recorded as `None`; judging it is left to the
/// verifiers so that each missing item is attributed to its own clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMessage {
    /// The still-encoded SAML message.
    pub encoded_payload: Option<String>,
    /// The relay state, already in its transmitted text form.
    pub relay_state: Option<String>,
    /// Binding-specific raw attributes needed for shape checks.
    pub carrier: Carrier,
}

/// The structure that carried the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Carrier {
    /// An HTML form; `None` if no form with a SAMLResponse control exists.
    Form(Option<FormCarrier>),
    /// The query string of a redirect.
    Query(QueryCarrier),
}

/// Why a decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// The value was not valid percent-encoding.
    UrlDecode,
    /// The value was not valid base64.
    Base64Decode,
    /// The value was not a raw DEFLATE stream.
    Inflate,
    /// The value contained linefeeds or other whitespace.
    WhitespaceDetected,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UrlDecode => "URL decoding",
            Self::Base64Decode => "base64 decoding",
            Self::Inflate => "inflating",
            Self::WhitespaceDetected => "whitespace check",
        })
    }
}

/// Failure to reverse a binding's encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// One stage of the decode pipeline failed; later stages did not run.
    #[error("{stage} failed: {detail}")]
    Stage {
        /// The failing stage.
        stage: DecodeStage,
        /// What the stage reported.
        detail: String,
    },

    /// The Redirect `SAMLEncoding` names an encoding other than DEFLATE.
    #[error("unsupported SAMLEncoding: {0}")]
    UnsupportedEncoding(String),
}

impl DecodeError {
    /// Creates a stage failure.
    pub fn stage(stage: DecodeStage, detail: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            detail: detail.into(),
        }
    }

    /// Returns the failing stage, or `None` for an unsupported encoding.
    #[must_use]
    pub const fn failed_stage(&self) -> Option<DecodeStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::UnsupportedEncoding(_) => None,
        }
    }
}

/// A successfully decoded and parsed SAML message.
///
/// Only obtainable from a decoded XML string, so a document never exists
/// without a completed decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    xml: String,
    document: XmlDocument,
}

impl DecodedMessage {
    /// Parses decoded XML into a message.
    pub fn parse(xml: String) -> Result<Self, ParseError> {
        let document = DomBuilder::parse_xml(&xml)?;
        Ok(Self { xml, document })
    }

    /// Returns the decoded XML.
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Returns the parsed document.
    #[must_use]
    pub fn document(&self) -> &XmlDocument {
        &self.document
    }
}
