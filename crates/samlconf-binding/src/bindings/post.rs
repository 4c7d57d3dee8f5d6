//! HTTP-POST Binding implementation.
//!
//! Reverses the SAML 2.0 HTTP-POST binding: locates the HTML form carrying
//! the SAML response, extracts its controls, and base64-decodes the message.

use base64::Engine;

use crate::constants::{
    ACTION, FORM, INPUT, METHOD, NAME, RELAY_STATE, SAML_RESPONSE, TEXTAREA, TYPE, VALUE,
};
use crate::context::HttpResponseView;
use crate::dom::{Document, DomBuilder, Element};

use super::{Carrier, DecodeError, DecodeStage, ExtractedMessage};

/// Elements that can carry a named form value.
const CONTROL_ELEMENTS: [&str; 2] = [INPUT, TEXTAREA];

/// A form control as it appeared in the response page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormControl {
    /// The literal `name` attribute.
    pub name: Option<String>,
    /// The literal `type` attribute.
    pub control_type: Option<String>,
    /// The control value: its text if non-empty, else its `value` attribute if non-empty.
    pub value: Option<String>,
}

impl FormControl {
    fn from_element(element: &Element) -> Self {
        Self {
            name: element.attribute(NAME).map(String::from),
            control_type: element.attribute(TYPE).map(String::from),
            value: control_value(element),
        }
    }
}

/// The HTML form that carried a SAML response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCarrier {
    /// The literal `action` attribute.
    pub action: Option<String>,
    /// The literal `method` attribute.
    pub method: Option<String>,
    /// The control named SAMLResponse, compared case-insensitively.
    pub saml_response_control: Option<FormControl>,
    /// The control named RelayState, compared case-insensitively.
    pub relay_state_control: Option<FormControl>,
}

/// HTTP-POST binding decoder/encoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Extracts the SAML response form and its controls from a response page.
    ///
    /// Never fails: anything missing is recorded as `None`.
    #[must_use]
    pub fn extract(response: &HttpResponseView) -> ExtractedMessage {
        let body = response.body_text();
        let form = DomBuilder::parse_html(&body)
            .ok()
            .and_then(|page| find_response_form(&page).map(form_carrier));

        let (encoded_payload, relay_state) = form.as_ref().map_or((None, None), |form| {
            (
                form.saml_response_control
                    .as_ref()
                    .and_then(|control| control.value.clone()),
                form.relay_state_control
                    .as_ref()
                    .and_then(|control| control.value.clone()),
            )
        });

        ExtractedMessage {
            encoded_payload,
            relay_state,
            carrier: Carrier::Form(form),
        }
    }

    /// Decodes a base64-encoded SAML message.
    ///
    /// ASCII whitespace inside the value is ignored, since form values are
    /// commonly line-wrapped. Any failure, including invalid UTF-8, is
    /// reported as [`DecodeStage::Base64Decode`].
    pub fn decode(encoded: &str) -> Result<String, DecodeError> {
        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| DecodeError::stage(DecodeStage::Base64Decode, e.to_string()))?;

        String::from_utf8(decoded).map_err(|e| {
            DecodeError::stage(
                DecodeStage::Base64Decode,
                format!("invalid UTF-8 in message: {e}"),
            )
        })
    }

    /// Base64-encodes a SAML message for the POST binding.
    #[must_use]
    pub fn encode_message(xml: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(xml)
    }

    /// Encodes a SAML response as an auto-submitting HTML form.
    #[must_use]
    pub fn encode_response(xml: &str, destination: &str, relay_state: Option<&str>) -> String {
        let relay_state_input = relay_state
            .map(|rs| {
                format!(
                    r#"<input type="hidden" name="{RELAY_STATE}" value="{}"/>"#,
                    html_escape(rs)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>SAML POST Binding</title>
</head>
<body onload="document.forms[0].submit()">
    <noscript>
        <p>JavaScript is disabled. Click the button below to continue.</p>
    </noscript>
    <form method="POST" action="{}">
        <input type="hidden" name="{SAML_RESPONSE}" value="{}"/>
        {}
        <noscript>
            <input type="submit" value="Continue"/>
        </noscript>
    </form>
</body>
</html>"#,
            html_escape(destination),
            Self::encode_message(xml),
            relay_state_input
        )
    }
}

/// Finds the first form, anywhere in the page, that has a control named
/// SAMLResponse (compared case-insensitively).
#[must_use]
pub fn find_response_form(page: &Document) -> Option<&Element> {
    page.elements_named(FORM)
        .into_iter()
        .find(|form| find_control(form, SAML_RESPONSE).is_some())
}

fn find_control<'a>(form: &'a Element, name: &str) -> Option<&'a Element> {
    form.descendants().into_iter().find(|element| {
        CONTROL_ELEMENTS.contains(&element.local_name())
            && element
                .attribute(NAME)
                .is_some_and(|value| value.eq_ignore_ascii_case(name))
    })
}

fn form_carrier(form: &Element) -> FormCarrier {
    FormCarrier {
        action: form.attribute(ACTION).map(String::from),
        method: form.attribute(METHOD).map(String::from),
        saml_response_control: find_control(form, SAML_RESPONSE).map(FormControl::from_element),
        relay_state_control: find_control(form, RELAY_STATE).map(FormControl::from_element),
    }
}

fn control_value(control: &Element) -> Option<String> {
    let text = control.text();
    if !text.is_empty() {
        return Some(text);
    }
    control
        .attribute(VALUE)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Escapes HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> HttpResponseView {
        HttpResponseView::with_body(200, body)
    }

    #[test]
    fn extract_from_encoded_form() {
        let xml = r#"<samlp:Response>test</samlp:Response>"#;
        let html = HttpPostBinding::encode_response(xml, "https://sp.example.com/acs", Some("state123"));

        let extracted = HttpPostBinding::extract(&page(&html));
        assert_eq!(extracted.relay_state.as_deref(), Some("state123"));

        let encoded = extracted.encoded_payload.unwrap();
        assert_eq!(HttpPostBinding::decode(&encoded).unwrap(), xml);

        let Carrier::Form(Some(form)) = extracted.carrier else {
            panic!("expected a form carrier");
        };
        assert_eq!(form.action.as_deref(), Some("https://sp.example.com/acs"));
        assert_eq!(form.method.as_deref(), Some("POST"));
        let control = form.saml_response_control.unwrap();
        assert_eq!(control.name.as_deref(), Some("SAMLResponse"));
        assert_eq!(control.control_type.as_deref(), Some("hidden"));
    }

    #[test]
    fn nested_form_and_controls_are_found() {
        let html = r#"<html><body><div><p>Redirecting</p><div>
            <form method="POST" action="https://sp.example/acs"><div>
                <input type="hidden" name="samlResponse" value="PHNhbWxwOlJlc3BvbnNlLz4="/>
            </div></form></div></div></body></html>"#;

        let extracted = HttpPostBinding::extract(&page(html));
        assert_eq!(
            extracted.encoded_payload.as_deref(),
            Some("PHNhbWxwOlJlc3BvbnNlLz4=")
        );
        assert_eq!(extracted.relay_state, None);
    }

    #[test]
    fn control_text_wins_over_value_attribute() {
        let html = r#"<form>
            <textarea name="SAMLResponse" value="attribute">text</textarea>
            <input name="RelayState" value=""/></form>"#;

        let extracted = HttpPostBinding::extract(&page(html));
        assert_eq!(extracted.encoded_payload.as_deref(), Some("text"));
        assert_eq!(extracted.relay_state, None);

        let Carrier::Form(Some(form)) = extracted.carrier else {
            panic!("expected a form carrier");
        };
        assert!(form.relay_state_control.is_some());
    }

    #[test]
    fn missing_form_yields_none() {
        let extracted = HttpPostBinding::extract(&page("<html><body>error</body></html>"));
        assert_eq!(extracted.encoded_payload, None);
        assert_eq!(extracted.carrier, Carrier::Form(None));
    }

    #[test]
    fn decode_tolerates_line_wrapping() {
        let encoded = "PHNhbWxwOlJl\nc3BvbnNlLz4=";
        assert_eq!(HttpPostBinding::decode(encoded).unwrap(), "<samlp:Response/>");
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = HttpPostBinding::decode("not*base64").unwrap_err();
        assert_eq!(err.failed_stage(), Some(DecodeStage::Base64Decode));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([0xff, 0xfe, 0xfd]);
        let err = HttpPostBinding::decode(&encoded).unwrap_err();
        assert_eq!(err.failed_stage(), Some(DecodeStage::Base64Decode));
    }

    #[test]
    fn html_escape_special_chars() {
        let input = r#"<script>alert("xss")</script>"#;
        let escaped = html_escape(input);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('"'));
    }
}
