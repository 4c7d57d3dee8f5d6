//! Per-deployment response rewriting.
//!
//! Identity providers differ in what happens between the authentication
//! request and the SAML response: login pages, consent screens, extra
//! redirects. A [`ResponseRewriter`] drives those interactions and returns
//! the response that actually carries the SAML message. The harness picks
//! one at startup and passes it in explicitly.

use crate::bindings::Binding;
use crate::context::HttpResponseView;

/// Turns the identity provider's first response into the one carrying the
/// SAML response.
pub trait ResponseRewriter: Send + Sync {
    /// Handles the response to an authentication request sent with the POST binding.
    fn response_for_post_request(&self, original: HttpResponseView) -> HttpResponseView;

    /// Handles the response to an authentication request sent with the Redirect binding.
    fn response_for_redirect_request(&self, original: HttpResponseView) -> HttpResponseView;

    /// Dispatches on the binding the request was sent with.
    fn rewrite(&self, request_binding: Binding, original: HttpResponseView) -> HttpResponseView {
        match request_binding {
            Binding::Post => self.response_for_post_request(original),
            Binding::Redirect => self.response_for_redirect_request(original),
        }
    }
}

/// Returns responses unchanged, for identity providers that answer directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ResponseRewriter for PassThrough {
    fn response_for_post_request(&self, original: HttpResponseView) -> HttpResponseView {
        original
    }

    fn response_for_redirect_request(&self, original: HttpResponseView) -> HttpResponseView {
        original
    }
}

/// A closure rewrites responses to both bindings the same way.
impl<F> ResponseRewriter for F
where
    F: Fn(HttpResponseView) -> HttpResponseView + Send + Sync,
{
    fn response_for_post_request(&self, original: HttpResponseView) -> HttpResponseView {
        self(original)
    }

    fn response_for_redirect_request(&self, original: HttpResponseView) -> HttpResponseView {
        self(original)
    }
}
