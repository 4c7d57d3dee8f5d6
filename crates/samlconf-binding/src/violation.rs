//! Compliance violations.
//!
//! A [`Violation`] is the terminal value of a failed verification. It names
//! the clause(s) of the SAML specification that were broken, optionally the
//! offending property with its actual and expected values, and chains the
//! lower-level decode or parse failure that triggered it.

use std::fmt;

use thiserror::Error;

use crate::bindings::DecodeError;
use crate::bindings::DecodeStage;
use crate::clauses::{self, Clause};
use crate::constants::IDP_ERROR_RESPONSE_REMINDER;
use crate::dom::{pretty_print_xml, ParseError};

/// Result type for verification operations.
pub type VerifyResult<T> = Result<T, Violation>;

/// A required item that could not be found in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// A non-error HTTP status code.
    HttpStatusCode,
    /// The HTML form carrying the SAMLResponse control.
    ResponseForm,
    /// The SAMLResponse form control.
    SamlResponseControl,
    /// The encoded SAMLResponse value.
    SamlResponse,
    /// The RelayState form control.
    RelayStateControl,
    /// The Location URL of a redirect.
    Url,
    /// The path of the Location URL.
    Path,
    /// The query parameters of the Location URL.
    Parameters,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HttpStatusCode => "HTTP Status Code",
            Self::ResponseForm => "SAMLResponse form",
            Self::SamlResponseControl => "SAMLResponse form control",
            Self::SamlResponse => "SAMLResponse",
            Self::RelayStateControl => "RelayState form control",
            Self::Url => "Url",
            Self::Path => "Path",
            Self::Parameters => "Parameters",
        })
    }
}

/// A form attribute checked by the POST form-shape rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAttribute {
    /// The form `action`.
    Action,
    /// The form `method`.
    Method,
    /// The SAMLResponse control `name`.
    SamlResponseName,
    /// The SAMLResponse control `type`.
    SamlResponseType,
    /// The RelayState control `name`.
    RelayStateName,
    /// The RelayState control `type`.
    RelayStateType,
}

impl fmt::Display for FormAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Action => "form action",
            Self::Method => "form method",
            Self::SamlResponseName => "SAMLResponse control name",
            Self::SamlResponseType => "SAMLResponse control type",
            Self::RelayStateName => "RelayState control name",
            Self::RelayStateType => "RelayState control type",
        })
    }
}

/// What is wrong with a relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStateErrorKind {
    /// Longer than the allowed number of bytes.
    Length,
    /// Differs from the relay state that was sent.
    Mismatch,
    /// Sent but not returned.
    Missing,
}

/// Classification of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// The response uses neither the POST nor the Redirect binding.
    UnsupportedBinding,
    /// A required item is absent.
    Presence {
        /// The missing item.
        field: Field,
    },
    /// The encoded message could not be decoded.
    Decode {
        /// The first decode stage that failed.
        stage: DecodeStage,
    },
    /// The Redirect `SAMLEncoding` is not DEFLATE.
    UnsupportedEncoding,
    /// The decoded message is not well-formed XML.
    Parse,
    /// The POST form is shaped incorrectly.
    FormShape {
        /// The offending attribute.
        attribute: FormAttribute,
    },
    /// The Web Browser SSO profile signing rules are not met.
    Profile,
    /// A signed message names the wrong destination.
    Destination,
    /// The relay state is unacceptable.
    RelayState {
        /// What is wrong with it.
        kind: RelayStateErrorKind,
    },
}

/// The lower-level failure behind a violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Cause {
    /// Decoding the encoded message failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Building the document tree failed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A SAML compliance violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} [{}]", clauses::join(.clauses))]
pub struct Violation {
    kind: ViolationKind,
    clauses: Vec<Clause>,
    message: String,
    property: Option<String>,
    actual: Option<String>,
    expected: Option<String>,
    #[source]
    cause: Option<Cause>,
    node: Option<String>,
    raw_body: Option<String>,
}

impl Violation {
    /// Creates a violation citing `clauses`.
    pub fn new(kind: ViolationKind, clauses: &[Clause], message: impl Into<String>) -> Self {
        Self {
            kind,
            clauses: clauses.to_vec(),
            message: message.into(),
            property: None,
            actual: None,
            expected: None,
            cause: None,
            node: None,
            raw_body: None,
        }
    }

    /// Creates a violation about one property's value.
    ///
    /// The message is derived from the property and its values.
    pub fn with_property_message(
        kind: ViolationKind,
        clauses: &[Clause],
        property: impl Into<String>,
        actual: Option<&str>,
        expected: Option<&str>,
    ) -> Self {
        let property = property.into();
        let mut message = format!(
            "The {property} was \"{}\".",
            actual.unwrap_or("null")
        );
        if let Some(expected) = expected {
            message.push_str(&format!(" Expected {expected}."));
        }

        Self {
            property: Some(property),
            actual: actual.map(String::from),
            expected: expected.map(String::from),
            ..Self::new(kind, clauses, message)
        }
    }

    /// Attaches the failure that caused this violation.
    #[must_use]
    pub fn caused_by(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Attaches the offending document, pretty-printed when possible.
    #[must_use]
    pub fn with_node(mut self, xml: &str) -> Self {
        self.node = Some(pretty_print_xml(xml).unwrap_or_else(|| xml.to_string()));
        self
    }

    /// Attaches the raw response body for responses whose carrier was not found.
    #[must_use]
    pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// Appends the induced-error reminder to the message.
    #[must_use]
    pub fn with_error_reminder(mut self) -> Self {
        self.message.push('\n');
        self.message.push_str(IDP_ERROR_RESPONSE_REMINDER);
        self
    }

    /// Returns the classification of this violation.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Returns the violated clauses in citation order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns the printable ids of the violated clauses.
    #[must_use]
    pub fn clause_ids(&self) -> Vec<&'static str> {
        self.clauses.iter().map(Clause::id).collect()
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the name of the offending property, if any.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Returns the actual value of the offending property, if any.
    #[must_use]
    pub fn actual(&self) -> Option<&str> {
        self.actual.as_deref()
    }

    /// Returns the expected value of the offending property, if any.
    #[must_use]
    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    /// Returns the lower-level failure, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Returns the pretty-printed offending document, if any.
    #[must_use]
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// Returns the raw response body, if the carrier could not be located.
    #[must_use]
    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn display_cites_clauses() {
        let violation = Violation::new(
            ViolationKind::Presence {
                field: Field::ResponseForm,
            },
            &[Clause::Bindings_3_5_4_a, Clause::Bindings_3_5_4_b],
            "The form containing the SAMLResponse form control could not be found.",
        );

        assert_eq!(
            violation.to_string(),
            "The form containing the SAMLResponse form control could not be found. \
             [SAMLBindings.3.5.4_a, SAMLBindings.3.5.4_b]"
        );
        assert_eq!(
            violation.clause_ids(),
            ["SAMLBindings.3.5.4_a", "SAMLBindings.3.5.4_b"]
        );
    }

    #[test]
    fn property_message() {
        let violation = Violation::with_property_message(
            ViolationKind::RelayState {
                kind: RelayStateErrorKind::Mismatch,
            },
            &[Clause::Bindings_3_4_3_b],
            "RelayState",
            Some("abc"),
            Some("xyz"),
        );

        assert_eq!(violation.property(), Some("RelayState"));
        assert_eq!(violation.actual(), Some("abc"));
        assert_eq!(violation.expected(), Some("xyz"));
        assert_eq!(violation.message(), "The RelayState was \"abc\". Expected xyz.");
    }

    #[test]
    fn reminder_is_appended() {
        let violation =
            Violation::new(ViolationKind::Parse, &[Clause::Bindings_3_5_4_a1], "bad")
                .with_error_reminder();

        assert!(violation.message().starts_with("bad\n"));
        assert!(violation.message().ends_with(IDP_ERROR_RESPONSE_REMINDER));
    }

    #[test]
    fn cause_is_error_source() {
        let violation = Violation::new(
            ViolationKind::Decode {
                stage: DecodeStage::Base64Decode,
            },
            &[Clause::Bindings_3_5_4_a],
            "The SAML response could not be base64 decoded.",
        )
        .caused_by(DecodeError::stage(DecodeStage::Base64Decode, "invalid byte"));

        let source = violation.source().unwrap();
        assert!(source.to_string().contains("invalid byte"));
        assert!(matches!(violation.cause(), Some(Cause::Decode(_))));
    }
}
