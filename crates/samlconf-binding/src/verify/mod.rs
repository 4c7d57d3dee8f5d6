//! Structural verification of identity provider responses.
//!
//! Each binding has two fail-fast chains:
//!
//! - [`Chain::Success`] expects a successful SSO response and runs every
//!   check the binding defines.
//! - [`Chain::Error`] expects a well-formed SAML error response after the
//!   identity provider was deliberately driven into an error. It stops after
//!   the message parses, cites the error-reporting clauses, and appends
//!   [`IDP_ERROR_RESPONSE_REMINDER`] to every violation.
//!
//! The first failing check wins; no later check runs.
//!
//! [`IDP_ERROR_RESPONSE_REMINDER`]: crate::constants::IDP_ERROR_RESPONSE_REMINDER

mod post;
mod redirect;

pub use post::PostBindingVerifier;
pub use redirect::RedirectBindingVerifier;

use serde::{Deserialize, Serialize};

use crate::bindings::{classify, Binding, DecodedMessage};
use crate::clauses::Clause;
use crate::constants::{DESTINATION, HTTP_ERROR_THRESHOLD, RELAY_STATE, SIGNATURE};
use crate::context::{HttpResponseView, RequestContext};
use crate::dom::{pretty_print_xml, Element};
use crate::responder::ResponseRewriter;
use crate::violation::{Field, RelayStateErrorKind, Violation, ViolationKind, VerifyResult};

/// Which verification chain to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// The request should have produced a successful SSO response.
    #[default]
    Success,
    /// The request deliberately drove the identity provider into an error.
    Error,
}

impl Chain {
    /// Adapts a violation to this chain's reporting conventions.
    #[must_use]
    pub fn annotate(self, violation: Violation) -> Violation {
        match self {
            Self::Success => violation,
            Self::Error => violation.with_error_reminder(),
        }
    }
}

/// The success value of every chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedResponse {
    /// The binding the response used.
    pub binding: Binding,
    /// The decoded message and its document.
    pub message: DecodedMessage,
    /// The relay state echoed by the identity provider.
    pub relay_state: Option<String>,
}

/// Decode-and-verify for one binding.
pub trait BindingVerifier {
    /// Runs the successful-response chain.
    fn decode_and_verify(&self) -> VerifyResult<VerifiedResponse>;

    /// Runs the induced-error chain.
    fn decode_and_verify_error(&self) -> VerifyResult<VerifiedResponse>;

    /// Runs the selected chain.
    fn verify(&self, chain: Chain) -> VerifyResult<VerifiedResponse> {
        match chain {
            Chain::Success => self.decode_and_verify(),
            Chain::Error => self.decode_and_verify_error(),
        }
    }
}

/// Classifies a response by binding and runs the selected chain on it.
pub fn verify_response(
    response: &HttpResponseView,
    context: &RequestContext,
    chain: Chain,
) -> VerifyResult<VerifiedResponse> {
    let binding = classify(response).map_err(|violation| chain.annotate(violation))?;
    tracing::debug!(%binding, ?chain, "verifying response");

    match binding {
        Binding::Post => PostBindingVerifier::new(response, context).verify(chain),
        Binding::Redirect => RedirectBindingVerifier::new(response, context).verify(chain),
    }
}

/// Rewrites a response for the binding the request used, then verifies it.
///
/// `request_binding` is the binding of the request that produced the
/// response, not the binding the response is classified as.
pub fn verify_rewritten<R>(
    rewriter: &R,
    request_binding: Binding,
    response: HttpResponseView,
    context: &RequestContext,
    chain: Chain,
) -> VerifyResult<VerifiedResponse>
where
    R: ResponseRewriter + ?Sized,
{
    let response = rewriter.rewrite(request_binding, response);
    verify_response(&response, context, chain)
}

// ============================================================================
// Shared checks
// ============================================================================

/// Status codes at or above 400 are rejected.
pub(crate) fn verify_status_below_error(
    status_code: u16,
    clause: Clause,
) -> VerifyResult<()> {
    if status_code >= HTTP_ERROR_THRESHOLD {
        return Err(Violation::with_property_message(
            ViolationKind::Presence {
                field: Field::HttpStatusCode,
            },
            &[clause],
            Field::HttpStatusCode.to_string(),
            Some(&status_code.to_string()),
            Some(&format!(
                "a non-error http status code; i.e. less than {HTTP_ERROR_THRESHOLD}"
            )),
        ));
    }
    tracing::trace!(status_code, "status code accepted");
    Ok(())
}

/// Builds the document tree of a decoded message.
pub(crate) fn parse_decoded(xml: String, clauses: &[Clause]) -> VerifyResult<DecodedMessage> {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let pretty = pretty_print_xml(&xml);
        tracing::debug!(
            xml = pretty.as_deref().unwrap_or(xml.as_str()),
            "Decoded SAML Response"
        );
    }

    DecodedMessage::parse(xml.clone()).map_err(|e| {
        Violation::new(
            ViolationKind::Parse,
            clauses,
            "The decoded SAML response is not well-formed XML.",
        )
        .with_node(&xml)
        .caused_by(e)
    })
}

/// Checks the returned relay state against its size limit and, if one was
/// sent, against the value sent.
pub(crate) fn verify_relay_state(
    relay_state: Option<&str>,
    context: &RequestContext,
    length_clause: Clause,
    mismatch_clause: Clause,
) -> VerifyResult<()> {
    if let Some(value) = relay_state {
        if value.len() > context.max_relay_state_bytes {
            return Err(Violation::with_property_message(
                ViolationKind::RelayState {
                    kind: RelayStateErrorKind::Length,
                },
                &[length_clause],
                RELAY_STATE,
                Some(value),
                Some(&format!(
                    "no more than {} bytes",
                    context.max_relay_state_bytes
                )),
            ));
        }
    }

    if context.relay_state_sent && relay_state != Some(context.expected_relay_state.as_str()) {
        return Err(Violation::with_property_message(
            ViolationKind::RelayState {
                kind: RelayStateErrorKind::Mismatch,
            },
            &[mismatch_clause],
            RELAY_STATE,
            relay_state,
            Some(&context.expected_relay_state),
        ));
    }

    tracing::trace!("relay state accepted");
    Ok(())
}

/// Checks that a signed message names the ACS URL as its destination.
/// Unsigned messages are exempt.
pub(crate) fn verify_destination(
    message: &DecodedMessage,
    signed: bool,
    acs_url: Option<&str>,
    clause: Clause,
) -> VerifyResult<()> {
    if !signed {
        tracing::trace!("unsigned message exempt from destination check");
        return Ok(());
    }

    let destination = message.document().root().attribute(DESTINATION);
    if destination.is_none() || destination != acs_url {
        return Err(Violation::with_property_message(
            ViolationKind::Destination,
            &[clause],
            DESTINATION,
            destination,
            acs_url,
        )
        .with_node(message.xml()));
    }

    tracing::trace!(destination, "destination accepted");
    Ok(())
}

/// Whether a `Signature` element exists anywhere in the document.
pub(crate) fn has_signature(root: &Element) -> bool {
    root.local_name() == SIGNATURE || !root.descendants_named(SIGNATURE).is_empty()
}
