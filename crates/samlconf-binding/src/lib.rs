//! SAML 2.0 binding conformance checks for identity provider responses.
//!
//! This crate decides whether an identity provider's HTTP response delivers
//! its SAML response the way the SAML 2.0 Bindings specification requires:
//!
//! - **Classification** - is the response an HTTP-POST form or an
//!   HTTP-Redirect?
//! - **Extraction and decoding** - reverse the binding's encoding to the
//!   SAML XML, reporting exactly which stage failed
//! - **Structural verification** - fail-fast check chains that attribute
//!   each failure to a clause of the SAML 2.0 Bindings or Profiles
//!
//! # Architecture
//!
//! - [`bindings`] - classification, extraction and decoding per binding
//! - [`verify`] - the successful-response and induced-error check chains
//! - [`violation`] - the violation taxonomy
//! - [`clauses`] - identifiers of the cited specification sentences
//! - [`constants`] - carrier names, URIs and limits
//! - [`context`] - the inputs of a verification call
//! - [`dom`] - document trees for decoded messages and response pages
//! - [`responder`] - per-deployment response rewriting
//!
//! # Example
//!
//! ```rust,ignore
//! use samlconf_binding::{verify_response, Chain, HttpResponseView, RequestContext};
//!
//! match verify_response(&response, &context, Chain::Success) {
//!     Ok(verified) => println!("{}", verified.message.xml()),
//!     Err(violation) => eprintln!("{violation}"),
//! }
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [SAML 2.0 Profiles](https://docs.oasis-open.org/security/saml/v2.0/saml-profiles-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod clauses;
pub mod constants;
pub mod context;
pub mod dom;
pub mod responder;
pub mod verify;
pub mod violation;

pub use bindings::{classify, Binding, DecodeError, DecodeStage, DecodedMessage};
pub use clauses::Clause;
pub use context::{AcsUrls, HttpResponseView, RequestContext};
pub use responder::{PassThrough, ResponseRewriter};
pub use verify::{verify_response, verify_rewritten, BindingVerifier, Chain, VerifiedResponse};
pub use violation::{Violation, ViolationKind, VerifyResult};
