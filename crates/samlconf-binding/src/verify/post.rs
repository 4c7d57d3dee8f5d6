//! POST binding verifier.

use crate::bindings::{Binding, Carrier, DecodedMessage, FormCarrier, FormControl, HttpPostBinding};
use crate::clauses::Clause;
use crate::constants::{ASSERTION, HIDDEN, POST, RELAY_STATE, SAML_RESPONSE, SIGNATURE};
use crate::context::{HttpResponseView, RequestContext};
use crate::violation::{
    Field, FormAttribute, RelayStateErrorKind, Violation, ViolationKind, VerifyResult,
};

use super::{
    has_signature, parse_decoded, verify_destination, verify_relay_state,
    verify_status_below_error, BindingVerifier, VerifiedResponse,
};

/// Clauses cited by one POST chain.
struct PostClauses {
    carrier: &'static [Clause],
    decode: &'static [Clause],
}

const SUCCESS: PostClauses = PostClauses {
    carrier: &[Clause::Bindings_3_5_4_a, Clause::Bindings_3_5_4_b],
    decode: &[Clause::Bindings_3_5_4_a],
};

const ERROR: PostClauses = PostClauses {
    carrier: &[Clause::Bindings_3_5_4_a2, Clause::Bindings_3_5_4_b1],
    decode: &[Clause::Bindings_3_5_4_a1],
};

/// Verifies a response delivered with the HTTP-POST binding.
pub struct PostBindingVerifier<'a> {
    response: &'a HttpResponseView,
    context: &'a RequestContext,
    form: Option<FormCarrier>,
    saml_response: Option<String>,
    relay_state: Option<String>,
}

impl<'a> PostBindingVerifier<'a> {
    /// Extracts the POST carrier from `response`.
    #[must_use]
    pub fn new(response: &'a HttpResponseView, context: &'a RequestContext) -> Self {
        let extracted = HttpPostBinding::extract(response);
        let form = match extracted.carrier {
            Carrier::Form(form) => form,
            Carrier::Query(_) => None,
        };

        Self {
            response,
            context,
            form,
            saml_response: extracted.encoded_payload,
            relay_state: extracted.relay_state,
        }
    }

    /// Checks that the form, its controls and their values are present.
    ///
    /// Returns the form and the encoded SAMLResponse.
    fn verify_no_nulls(&self, clauses: &PostClauses) -> VerifyResult<(&FormCarrier, &str)> {
        let Some(form) = self.form.as_ref() else {
            let body = self.response.body_text();
            tracing::debug!(body = %body, "SAMLResponse form not found");
            return Err(Violation::new(
                ViolationKind::Presence {
                    field: Field::ResponseForm,
                },
                clauses.carrier,
                "The form containing the SAMLResponse form control could not be found.",
            )
            .with_raw_body(body.into_owned()));
        };

        if form.saml_response_control.is_none() {
            return Err(Violation::new(
                ViolationKind::Presence {
                    field: Field::SamlResponseControl,
                },
                clauses.carrier,
                "The SAMLResponse form control could not be found.",
            ));
        }

        if self.context.relay_state_sent && form.relay_state_control.is_none() {
            return Err(Violation::new(
                ViolationKind::Presence {
                    field: Field::RelayStateControl,
                },
                &[Clause::Bindings_3_5_4_c],
                "The RelayState form control could not be found.",
            ));
        }

        let Some(saml_response) = self.saml_response.as_deref() else {
            return Err(Violation::new(
                ViolationKind::Presence {
                    field: Field::SamlResponse,
                },
                clauses.carrier,
                "The SAMLResponse within the SAMLResponse form control could not be found.",
            ));
        };

        if self.context.relay_state_sent && self.relay_state.is_none() {
            return Err(Violation::new(
                ViolationKind::RelayState {
                    kind: RelayStateErrorKind::Missing,
                },
                &[Clause::Bindings_3_5_3_b, Clause::Bindings_3_5_4_c],
                "The RelayState within the RelayState form control could not be found.",
            ));
        }

        tracing::trace!("POST carrier present");
        Ok((form, saml_response))
    }

    fn decode(encoded: &str, clauses: &PostClauses) -> VerifyResult<DecodedMessage> {
        let xml = HttpPostBinding::decode(encoded).map_err(|e| {
            let stage = e.failed_stage().unwrap_or(crate::bindings::DecodeStage::Base64Decode);
            Violation::new(
                ViolationKind::Decode { stage },
                clauses.decode,
                "The SAML response could not be base64 decoded.",
            )
            .caused_by(e)
        })?;

        parse_decoded(xml, clauses.decode)
    }

    /// Web Browser SSO profile: the response must be signed, and so must
    /// each of its assertions.
    fn verify_post_sso(message: &DecodedMessage) -> VerifyResult<()> {
        let root = message.document().root();
        let response_signed = root.children_named(SIGNATURE).next().is_some();
        let assertions_signed = root
            .children_named(ASSERTION)
            .all(|assertion| assertion.children_named(SIGNATURE).next().is_some());

        if !response_signed || !assertions_signed {
            return Err(Violation::new(
                ViolationKind::Profile,
                &[Clause::Profiles_4_1_4_5_a],
                "No digital signature found on the Response or Assertions.",
            )
            .with_node(message.xml()));
        }

        tracing::trace!("SSO profile signatures present");
        Ok(())
    }

    fn verify_post_form(&self, form: &FormCarrier) -> VerifyResult<()> {
        let acs_url = self.context.acs_url(Binding::Post);

        if form.action.is_none() || form.action.as_deref() != acs_url {
            return Err(form_violation(
                FormAttribute::Action,
                Clause::Bindings_3_5_4_d,
                form.action.as_deref(),
                acs_url,
            ));
        }

        if form.method.as_deref() != Some(POST) {
            return Err(form_violation(
                FormAttribute::Method,
                Clause::Bindings_3_5_4_d,
                form.method.as_deref(),
                Some(POST),
            ));
        }

        verify_control(
            form.saml_response_control.as_ref(),
            SAML_RESPONSE,
            (FormAttribute::SamlResponseName, Clause::Bindings_3_5_4_b),
            (FormAttribute::SamlResponseType, Clause::Bindings_3_5_4_a),
        )?;

        if self.context.relay_state_sent {
            verify_control(
                form.relay_state_control.as_ref(),
                RELAY_STATE,
                (FormAttribute::RelayStateName, Clause::Bindings_3_5_4_c),
                (FormAttribute::RelayStateType, Clause::Bindings_3_5_4_c),
            )?;
        }

        tracing::trace!("POST form shape accepted");
        Ok(())
    }

    fn verified(&self, message: DecodedMessage) -> VerifiedResponse {
        VerifiedResponse {
            binding: Binding::Post,
            message,
            relay_state: self.relay_state.clone(),
        }
    }
}

impl BindingVerifier for PostBindingVerifier<'_> {
    fn decode_and_verify(&self) -> VerifyResult<VerifiedResponse> {
        verify_status_below_error(self.response.status_code(), Clause::Bindings_3_5_6_a)?;
        let (form, saml_response) = self.verify_no_nulls(&SUCCESS)?;
        let message = Self::decode(saml_response, &SUCCESS)?;

        Self::verify_post_sso(&message)?;
        if self.context.relay_state_sent || self.relay_state.is_some() {
            verify_relay_state(
                self.relay_state.as_deref(),
                self.context,
                Clause::Bindings_3_5_3_a,
                Clause::Bindings_3_5_3_b,
            )?;
        }
        verify_destination(
            &message,
            has_signature(message.document().root()),
            self.context.acs_url(Binding::Post),
            Clause::Bindings_3_5_5_2_a,
        )?;
        self.verify_post_form(form)?;

        Ok(self.verified(message))
    }

    fn decode_and_verify_error(&self) -> VerifyResult<VerifiedResponse> {
        let result = verify_status_below_error(self.response.status_code(), Clause::Bindings_3_5_6_a)
            .and_then(|()| self.verify_no_nulls(&ERROR))
            .and_then(|(_, saml_response)| Self::decode(saml_response, &ERROR));

        result
            .map(|message| self.verified(message))
            .map_err(Violation::with_error_reminder)
    }
}

fn form_violation(
    attribute: FormAttribute,
    clause: Clause,
    actual: Option<&str>,
    expected: Option<&str>,
) -> Violation {
    Violation::with_property_message(
        ViolationKind::FormShape { attribute },
        &[clause],
        attribute.to_string(),
        actual,
        expected,
    )
}

/// The control's `name` must match exactly and its `type` must be `hidden`
/// in any case.
fn verify_control(
    control: Option<&FormControl>,
    name: &str,
    (name_attribute, name_clause): (FormAttribute, Clause),
    (type_attribute, type_clause): (FormAttribute, Clause),
) -> VerifyResult<()> {
    let actual_name = control.and_then(|c| c.name.as_deref());
    if actual_name != Some(name) {
        return Err(form_violation(name_attribute, name_clause, actual_name, Some(name)));
    }

    let actual_type = control.and_then(|c| c.control_type.as_deref());
    if !actual_type.is_some_and(|t| t.eq_ignore_ascii_case(HIDDEN)) {
        return Err(form_violation(type_attribute, type_clause, actual_type, Some(HIDDEN)));
    }

    Ok(())
}
