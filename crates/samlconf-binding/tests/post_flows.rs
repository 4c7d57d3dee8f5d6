//! HTTP-POST binding flows.

use base64::Engine;
use samlconf_binding::constants::{EXAMPLE_RELAY_STATE, IDP_ERROR_RESPONSE_REMINDER};
use samlconf_binding::violation::{FormAttribute, RelayStateErrorKind};
use samlconf_binding::{
    classify, verify_response, verify_rewritten, Binding, Chain, Clause, HttpResponseView,
    PassThrough, ViolationKind,
};

use crate::common::{context, error_response, post_page, signed_response, POST_ACS};

/// A bare form with an unsigned response decodes, then fails the SSO profile.
#[test]
fn test_unsigned_response_fails_profile() -> anyhow::Result<()> {
    let encoded = base64::engine::general_purpose::STANDARD.encode("<samlp:Response/>");
    let response = HttpResponseView::with_body(
        200,
        format!(r#"<form><input name="SAMLResponse" value="{encoded}"/></form>"#),
    );

    assert_eq!(classify(&response)?, Binding::Post);

    let violation = verify_response(&response, &context(), Chain::Success)
        .expect_err("unsigned response must not verify");
    assert_eq!(violation.kind(), ViolationKind::Profile);
    assert_eq!(violation.clause_ids(), ["SAMLProfiles.4.1.4.5_a"]);
    assert!(violation.node().is_some_and(|node| node.contains("samlp:Response")));

    Ok(())
}

/// Tests a fully conforming POST response with relay state.
#[test]
fn test_conforming_post_response() -> anyhow::Result<()> {
    let xml = signed_response(POST_ACS);
    let response = post_page(&xml, Some(EXAMPLE_RELAY_STATE));
    let context = context().relay_state_sent(EXAMPLE_RELAY_STATE);

    let verified = verify_response(&response, &context, Chain::Success)?;

    assert_eq!(verified.binding, Binding::Post);
    assert_eq!(verified.message.xml(), xml);
    assert_eq!(verified.message.document().root().local_name(), "Response");
    assert_eq!(verified.relay_state.as_deref(), Some(EXAMPLE_RELAY_STATE));

    Ok(())
}

/// Stray end tags around a conforming form do not hide it.
#[test]
fn test_conforming_post_response_in_sloppy_markup() -> anyhow::Result<()> {
    let xml = signed_response(POST_ACS);
    let page = post_page(&xml, Some(EXAMPLE_RELAY_STATE)).body_text().into_owned();
    let response = HttpResponseView::with_body(
        200,
        format!("{page}<div>Done</span></div></html></body>"),
    );
    let context = context().relay_state_sent(EXAMPLE_RELAY_STATE);

    assert_eq!(classify(&response)?, Binding::Post);
    let verified = verify_response(&response, &context, Chain::Success)?;
    assert_eq!(verified.message.xml(), xml);

    Ok(())
}

/// A signed response must name the POST ACS URL as its destination.
#[test]
fn test_signed_response_with_wrong_destination() -> anyhow::Result<()> {
    let response = post_page(&signed_response("https://attacker.example/acs"), None);

    let violation = verify_response(&response, &context(), Chain::Success)
        .expect_err("destination mismatch must not verify");

    assert_eq!(violation.kind(), ViolationKind::Destination);
    assert_eq!(violation.clauses(), [Clause::Bindings_3_5_5_2_a]);
    assert_eq!(violation.property(), Some("Destination"));
    assert_eq!(violation.expected(), Some(POST_ACS));

    Ok(())
}

/// An 81-byte relay state fails on length even when it is the value sent.
#[test]
fn test_relay_state_length_wins_over_match() -> anyhow::Result<()> {
    let relay_state = "r".repeat(81);
    let response = post_page(&signed_response(POST_ACS), Some(&relay_state));
    let context = context().relay_state_sent(relay_state);

    let violation = verify_response(&response, &context, Chain::Success)
        .expect_err("oversized relay state must not verify");

    assert_eq!(
        violation.kind(),
        ViolationKind::RelayState {
            kind: RelayStateErrorKind::Length
        }
    );
    assert_eq!(violation.clauses(), [Clause::Bindings_3_5_3_a]);

    Ok(())
}

/// Relay state checks run before the form shape is inspected.
#[test]
fn test_relay_state_mismatch_precedes_form_shape() -> anyhow::Result<()> {
    let html = HttpResponseView::with_body(
        200,
        post_page(&signed_response(POST_ACS), Some("wrong"))
            .body_text()
            .replace(r#"method="POST""#, r#"method="GET""#),
    );
    let context = context().relay_state_sent(EXAMPLE_RELAY_STATE);

    let violation = verify_response(&html, &context, Chain::Success)
        .expect_err("relay state mismatch must not verify");

    assert_eq!(
        violation.kind(),
        ViolationKind::RelayState {
            kind: RelayStateErrorKind::Mismatch
        }
    );
    assert_eq!(violation.actual(), Some("wrong"));
    assert_eq!(violation.expected(), Some(EXAMPLE_RELAY_STATE));

    Ok(())
}

/// Form shape is the last check of the POST chain.
#[test]
fn test_form_method_checked_last() -> anyhow::Result<()> {
    let html = HttpResponseView::with_body(
        200,
        post_page(&signed_response(POST_ACS), None)
            .body_text()
            .replace(r#"method="POST""#, r#"method="GET""#),
    );

    let violation = verify_response(&html, &context(), Chain::Success)
        .expect_err("GET form must not verify");

    assert_eq!(
        violation.kind(),
        ViolationKind::FormShape {
            attribute: FormAttribute::Method
        }
    );
    assert_eq!(violation.clauses(), [Clause::Bindings_3_5_4_d]);

    Ok(())
}

/// The error chain accepts an unsigned error response in any form shape.
#[test]
fn test_error_chain_accepts_error_response() -> anyhow::Result<()> {
    let html = post_page(&error_response(), None)
        .body_text()
        .replace(POST_ACS, "https://elsewhere.example");
    let response = HttpResponseView::with_body(200, html);

    let verified = verify_response(&response, &context(), Chain::Error)?;
    assert!(verified.message.xml().contains("status:Requester"));

    Ok(())
}

/// Transport errors are violations on the error chain too.
#[test]
fn test_error_chain_rejects_http_error() -> anyhow::Result<()> {
    let response = HttpResponseView::with_body(500, "Internal Server Error");

    let violation = verify_rewritten(
        &PassThrough,
        Binding::Post,
        response,
        &context(),
        Chain::Error,
    )
    .expect_err("no binding in an error page");

    assert_eq!(violation.kind(), ViolationKind::UnsupportedBinding);
    assert_eq!(violation.raw_body(), Some("Internal Server Error"));
    assert!(violation.message().ends_with(IDP_ERROR_RESPONSE_REMINDER));

    Ok(())
}

/// A rewriter can turn a login page into the response carrying the message.
#[test]
fn test_rewriter_replaces_login_page() -> anyhow::Result<()> {
    let xml = signed_response(POST_ACS);
    let rewriter = move |_login_page: HttpResponseView| post_page(&xml, None);
    let login_page = HttpResponseView::with_body(200, "<form action=\"/login\"></form>");

    let verified = verify_rewritten(&rewriter, Binding::Post, login_page, &context(), Chain::Success)?;
    assert_eq!(verified.binding, Binding::Post);

    Ok(())
}
