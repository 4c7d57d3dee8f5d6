//! Redirect binding verifier.

use crate::bindings::{
    Binding, Carrier, DecodeError, DecodeStage, DecodedMessage, HttpRedirectBinding, QueryCarrier,
};
use crate::clauses::Clause;
use crate::constants::{DEFLATE_ENCODING, REDIRECT_ERROR_STATUS_CODES};
use crate::context::{HttpResponseView, RequestContext};
use crate::violation::{Field, RelayStateErrorKind, Violation, ViolationKind, VerifyResult};

use super::{
    has_signature, parse_decoded, verify_destination, verify_relay_state,
    verify_status_below_error, BindingVerifier, VerifiedResponse,
};

/// Clauses cited by one Redirect chain.
struct RedirectClauses {
    relay_state_missing: Clause,
    url_or_base64: Clause,
    inflate: Clause,
    whitespace: Clause,
}

const SUCCESS: RedirectClauses = RedirectClauses {
    relay_state_missing: Clause::Bindings_3_4_3_b,
    url_or_base64: Clause::Bindings_3_4_4_1_b,
    inflate: Clause::Bindings_3_4_4_1_a,
    whitespace: Clause::Bindings_3_4_4_1_a,
};

const ERROR: RedirectClauses = RedirectClauses {
    relay_state_missing: Clause::Bindings_3_4_3_b1,
    url_or_base64: Clause::Bindings_3_4_4_1_b1,
    inflate: Clause::Bindings_3_4_4_1_a1,
    whitespace: Clause::Bindings_3_4_4_1_a2,
};

/// Verifies a response delivered with the HTTP-Redirect binding.
pub struct RedirectBindingVerifier<'a> {
    response: &'a HttpResponseView,
    context: &'a RequestContext,
    query: QueryCarrier,
    saml_response: Option<String>,
    relay_state: Option<String>,
}

impl<'a> RedirectBindingVerifier<'a> {
    /// Extracts the Redirect carrier from `response`.
    #[must_use]
    pub fn new(response: &'a HttpResponseView, context: &'a RequestContext) -> Self {
        let extracted = HttpRedirectBinding::extract(response);
        let query = match extracted.carrier {
            Carrier::Query(query) => query,
            Carrier::Form(_) => QueryCarrier::default(),
        };

        Self {
            response,
            context,
            query,
            saml_response: extracted.encoded_payload,
            relay_state: extracted.relay_state,
        }
    }

    /// Induced-error redirects must use 302 or 303; 200 is tolerated.
    fn verify_error_status_code(&self) -> VerifyResult<()> {
        let status_code = self.response.status_code();
        if !REDIRECT_ERROR_STATUS_CODES.contains(&status_code) {
            return Err(Violation::with_property_message(
                ViolationKind::Presence {
                    field: Field::HttpStatusCode,
                },
                &[Clause::Bindings_3_4_6_a],
                Field::HttpStatusCode.to_string(),
                Some(&status_code.to_string()),
                Some("302 or 303"),
            ));
        }
        Ok(())
    }

    /// Checks that the URL, its path and parameters, and the SAML values are
    /// present. Returns the encoded SAMLResponse.
    fn verify_no_nulls(&self, clauses: &RedirectClauses) -> VerifyResult<&str> {
        let missing = |field: Field| {
            Violation::new(
                ViolationKind::Presence { field },
                &[Clause::Bindings_3_4_4_a],
                format!("{field} not found."),
            )
        };

        if self.query.location.is_none() {
            let body = self.response.body_text();
            tracing::debug!(body = %body, "redirect Location not found");
            return Err(missing(Field::Url).with_raw_body(body.into_owned()));
        }
        if !self.query.has_path {
            return Err(missing(Field::Path));
        }
        if !self.query.has_parameters {
            let body = self.response.body_text();
            tracing::debug!(body = %body, "redirect parameters not found");
            return Err(missing(Field::Parameters).with_raw_body(body.into_owned()));
        }
        let Some(saml_response) = self.saml_response.as_deref() else {
            return Err(missing(Field::SamlResponse));
        };

        if self.context.relay_state_sent && self.relay_state.is_none() {
            return Err(Violation::new(
                ViolationKind::RelayState {
                    kind: RelayStateErrorKind::Missing,
                },
                &[clauses.relay_state_missing],
                "RelayState not found.",
            ));
        }

        tracing::trace!("redirect carrier present");
        Ok(saml_response)
    }

    fn decode(&self, encoded: &str, clauses: &RedirectClauses) -> VerifyResult<DecodedMessage> {
        let xml = HttpRedirectBinding::decode(encoded, self.query.saml_encoding.as_deref())
            .map_err(|e| decode_violation(e, clauses))?;

        parse_decoded(xml, &[Clause::Bindings_3_4_4_a])
    }

    /// Signed either inside the document or with a detached query signature.
    fn is_signed(&self, message: &DecodedMessage) -> bool {
        self.query.signature.is_some() || has_signature(message.document().root())
    }

    fn verified(&self, message: DecodedMessage) -> VerifiedResponse {
        VerifiedResponse {
            binding: Binding::Redirect,
            message,
            relay_state: self.relay_state.clone(),
        }
    }
}

impl BindingVerifier for RedirectBindingVerifier<'_> {
    fn decode_and_verify(&self) -> VerifyResult<VerifiedResponse> {
        verify_status_below_error(self.response.status_code(), Clause::Bindings_3_4_6_a)?;
        let saml_response = self.verify_no_nulls(&SUCCESS)?;
        let message = self.decode(saml_response, &SUCCESS)?;

        if self.context.relay_state_sent || self.relay_state.is_some() {
            verify_relay_state(
                self.relay_state.as_deref(),
                self.context,
                Clause::Bindings_3_4_3_a,
                Clause::Bindings_3_4_3_b,
            )?;
        }
        if let Some(sig_alg) = self.query.sig_alg.as_deref() {
            tracing::trace!(sig_alg, "detached signature present");
        }
        verify_destination(
            &message,
            self.is_signed(&message),
            self.context.acs_url(Binding::Redirect),
            Clause::Bindings_3_4_5_2_a,
        )?;

        Ok(self.verified(message))
    }

    fn decode_and_verify_error(&self) -> VerifyResult<VerifiedResponse> {
        let result = self
            .verify_error_status_code()
            .and_then(|()| self.verify_no_nulls(&ERROR))
            .and_then(|saml_response| self.decode(saml_response, &ERROR));

        result
            .map(|message| self.verified(message))
            .map_err(Violation::with_error_reminder)
    }
}

fn decode_violation(error: DecodeError, clauses: &RedirectClauses) -> Violation {
    let violation = match &error {
        DecodeError::UnsupportedEncoding(encoding) => Violation::with_property_message(
            ViolationKind::UnsupportedEncoding,
            &[Clause::Bindings_3_4_4_1],
            "SAMLEncoding",
            Some(encoding),
            Some(DEFLATE_ENCODING),
        ),
        DecodeError::Stage { stage, .. } => {
            let kind = ViolationKind::Decode { stage: *stage };
            match stage {
                DecodeStage::UrlDecode => Violation::new(
                    kind,
                    &[clauses.url_or_base64],
                    "Could not url decode the SAML response.",
                ),
                DecodeStage::Base64Decode => Violation::new(
                    kind,
                    &[clauses.url_or_base64],
                    "Could not base64 decode the SAML response.",
                ),
                DecodeStage::Inflate => Violation::new(
                    kind,
                    &[clauses.inflate, Clause::Bindings_3_4_4_1],
                    "Could not inflate the SAML response.",
                ),
                DecodeStage::WhitespaceDetected => Violation::new(
                    kind,
                    &[clauses.whitespace],
                    "There were linefeeds or whitespace in the SAML response.",
                ),
            }
        }
    };
    violation.caused_by(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::IDP_ERROR_RESPONSE_REMINDER;
    use crate::context::AcsUrls;

    const ACS: &str = "https://sp.example/acs/redirect";

    fn context() -> RequestContext {
        RequestContext::new(AcsUrls {
            post: None,
            redirect: Some(ACS.to_string()),
        })
    }

    fn redirect(status: u16, location: &str) -> HttpResponseView {
        HttpResponseView::with_body(status, "").with_header("Location", location)
    }

    fn location(xml: &str, relay_state: Option<&str>) -> String {
        HttpRedirectBinding::encode_response(xml, ACS, relay_state).unwrap()
    }

    #[test]
    fn verifies_unsigned_response() {
        let xml = r#"<samlp:Response Destination="https://elsewhere.example"/>"#;
        let response = redirect(302, &location(xml, Some("abc")));
        let context = context();

        let verified = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify()
            .unwrap();
        assert_eq!(verified.binding, Binding::Redirect);
        assert_eq!(verified.message.xml(), xml);
        assert_eq!(verified.relay_state.as_deref(), Some("abc"));
    }

    #[test]
    fn detached_signature_requires_destination() {
        let xml = r#"<samlp:Response Destination="https://elsewhere.example"/>"#;
        let url = format!("{}&SigAlg=rsa-sha256&Signature=c2ln", location(xml, None));
        let response = redirect(302, &url);
        let context = context();

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify()
            .unwrap_err();
        assert_eq!(violation.kind(), ViolationKind::Destination);
        assert_eq!(violation.clauses(), [Clause::Bindings_3_4_5_2_a]);
    }

    #[test]
    fn missing_location() {
        let response = HttpResponseView::with_body(302, "moved");
        let context = context();

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify()
            .unwrap_err();
        assert_eq!(violation.kind(), ViolationKind::Presence { field: Field::Url });
        assert_eq!(violation.message(), "Url not found.");
        assert_eq!(violation.raw_body(), Some("moved"));
    }

    #[test]
    fn missing_parameters() {
        let response = HttpResponseView::with_body(302, "see other")
            .with_header("Location", "https://sp.example/acs");
        let context = context();

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify()
            .unwrap_err();
        assert_eq!(
            violation.kind(),
            ViolationKind::Presence {
                field: Field::Parameters
            }
        );
        assert_eq!(violation.raw_body(), Some("see other"));
    }

    #[test]
    fn missing_saml_response() {
        let response = redirect(302, "https://sp.example/acs?RelayState=abc");
        let context = context();

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify()
            .unwrap_err();
        assert_eq!(
            violation.kind(),
            ViolationKind::Presence {
                field: Field::SamlResponse
            }
        );
        assert_eq!(violation.clauses(), [Clause::Bindings_3_4_4_a]);
    }

    #[test]
    fn missing_relay_state_on_error_path() {
        let response = redirect(302, &location("<samlp:Response/>", None));
        let context = context().relay_state_sent("abc");

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify_error()
            .unwrap_err();
        assert_eq!(violation.clauses(), [Clause::Bindings_3_4_3_b1]);
        assert!(violation.message().starts_with("RelayState not found.\n"));
    }

    #[test]
    fn percent_encoded_space_fails_base64() {
        let response = redirect(302, "https://sp.example/acs?SAMLResponse=abc%20defg");
        let context = context();

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify()
            .unwrap_err();
        assert_eq!(
            violation.kind(),
            ViolationKind::Decode {
                stage: DecodeStage::Base64Decode
            }
        );
    }

    #[test]
    fn decode_stage_clauses() {
        let context = context();
        let cases = [
            ("%G1", DecodeStage::UrlDecode, vec![Clause::Bindings_3_4_4_1_b]),
            ("!!!!", DecodeStage::Base64Decode, vec![Clause::Bindings_3_4_4_1_b]),
            (
                "%2F%2F%2F%2F",
                DecodeStage::Inflate,
                vec![Clause::Bindings_3_4_4_1_a, Clause::Bindings_3_4_4_1],
            ),
        ];

        for (payload, stage, clauses) in cases {
            let response = redirect(302, &format!("{ACS}?SAMLResponse={payload}"));
            let violation = RedirectBindingVerifier::new(&response, &context)
                .decode_and_verify()
                .unwrap_err();
            assert_eq!(violation.kind(), ViolationKind::Decode { stage }, "{payload}");
            assert_eq!(violation.clauses(), clauses.as_slice(), "{payload}");
        }
    }

    #[test]
    fn unsupported_encoding() {
        let url = format!(
            "{}&SAMLEncoding=urn%3Aexample%3Agzip",
            location("<samlp:Response/>", None)
        );
        let response = redirect(302, &url);
        let context = context();

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify()
            .unwrap_err();
        assert_eq!(violation.kind(), ViolationKind::UnsupportedEncoding);
        assert_eq!(violation.actual(), Some("urn:example:gzip"));
    }

    #[test]
    fn error_path_status_codes() {
        let context = context();
        let url = location("<samlp:Response/>", None);

        for status in [200, 302, 303] {
            let response = redirect(status, &url);
            assert!(RedirectBindingVerifier::new(&response, &context)
                .decode_and_verify_error()
                .is_ok());
        }

        let response = redirect(301, &url);
        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify_error()
            .unwrap_err();
        assert_eq!(violation.clauses(), [Clause::Bindings_3_4_6_a]);
        assert!(violation.message().ends_with(IDP_ERROR_RESPONSE_REMINDER));
    }

    #[test]
    fn error_path_inflate_clauses() {
        let response = redirect(302, &format!("{ACS}?SAMLResponse=%2F%2F%2F%2F"));
        let context = context();

        let violation = RedirectBindingVerifier::new(&response, &context)
            .decode_and_verify_error()
            .unwrap_err();
        assert_eq!(
            violation.clauses(),
            [Clause::Bindings_3_4_4_1_a1, Clause::Bindings_3_4_4_1]
        );
    }
}
