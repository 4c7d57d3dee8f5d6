//! Common test utilities and fixtures.

use samlconf_binding::bindings::{HttpPostBinding, HttpRedirectBinding};
use samlconf_binding::{AcsUrls, HttpResponseView, RequestContext};

/// POST ACS URL used by every fixture.
pub const POST_ACS: &str = "https://sp.example/acs/post";

/// Redirect ACS URL used by every fixture.
pub const REDIRECT_ACS: &str = "https://sp.example/acs/redirect";

/// Context with both ACS URLs and no relay state.
pub fn context() -> RequestContext {
    RequestContext::new(AcsUrls {
        post: Some(POST_ACS.to_string()),
        redirect: Some(REDIRECT_ACS.to_string()),
    })
}

/// A response and its assertion, both signed.
pub fn signed_response(destination: &str) -> String {
    format!(
        concat!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" "#,
            r#"xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" "#,
            r#"xmlns:ds="http://www.w3.org/2000/09/xmldsig#" ID="_r1" Version="2.0" "#,
            r#"Destination="{}">"#,
            r#"<ds:Signature><ds:SignatureValue>c2ln</ds:SignatureValue></ds:Signature>"#,
            r#"<samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>"#,
            r#"<saml:Assertion ID="_a1"><ds:Signature/><saml:Subject/></saml:Assertion>"#,
            r#"</samlp:Response>"#
        ),
        destination
    )
}

/// A SAML error response, unsigned.
pub fn error_response() -> String {
    concat!(
        r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_e1" Version="2.0">"#,
        r#"<samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Requester"/></samlp:Status>"#,
        r#"</samlp:Response>"#
    )
    .to_string()
}

/// An auto-submitting POST page carrying `xml`.
pub fn post_page(xml: &str, relay_state: Option<&str>) -> HttpResponseView {
    HttpResponseView::with_body(
        200,
        HttpPostBinding::encode_response(xml, POST_ACS, relay_state),
    )
}

/// A 302 redirect carrying `xml`.
pub fn redirect(xml: &str, relay_state: Option<&str>) -> anyhow::Result<HttpResponseView> {
    let location = HttpRedirectBinding::encode_response(xml, REDIRECT_ACS, relay_state)?;
    Ok(HttpResponseView::with_body(302, "").with_header("Location", location))
}
