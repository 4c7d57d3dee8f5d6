//! Names, URIs and limits used by the binding checks.
//!
//! Everything a verification call needs beyond its [`RequestContext`] lives
//! here as a plain constant.
//!
//! [`RequestContext`]: crate::context::RequestContext

// ============================================================================
// Carrier names
// ============================================================================

/// Form control / query parameter carrying a SAML response.
pub const SAML_RESPONSE: &str = "SAMLResponse";

/// Form control / query parameter carrying the relay state.
pub const RELAY_STATE: &str = "RelayState";

/// Query parameter naming the Redirect message encoding.
pub const SAML_ENCODING: &str = "SAMLEncoding";

/// Query parameter carrying a detached Redirect signature.
pub const SIGNATURE_PARAM: &str = "Signature";

/// Query parameter naming the detached signature algorithm.
pub const SIG_ALG: &str = "SigAlg";

/// Response header holding the Redirect target.
pub const LOCATION: &str = "Location";

/// The only `SAMLEncoding` this crate decodes.
pub const DEFLATE_ENCODING: &str = "urn:oasis:names:tc:SAML:2.0:bindings:URL-Encoding:DEFLATE";

// ============================================================================
// HTML form vocabulary
// ============================================================================

/// HTML form element name.
pub const FORM: &str = "form";

/// HTML input element name.
pub const INPUT: &str = "input";

/// HTML textarea element name.
pub const TEXTAREA: &str = "textarea";

/// `name` attribute of a form control.
pub const NAME: &str = "name";

/// `value` attribute of a form control.
pub const VALUE: &str = "value";

/// `type` attribute of a form control.
pub const TYPE: &str = "type";

/// Required `type` of the SAML form controls.
pub const HIDDEN: &str = "hidden";

/// `action` attribute of a form.
pub const ACTION: &str = "action";

/// `method` attribute of a form.
pub const METHOD: &str = "method";

/// Required form method, compared literally.
pub const POST: &str = "POST";

// ============================================================================
// SAML document vocabulary
// ============================================================================

/// Local name of an XML-DSig signature element.
pub const SIGNATURE: &str = "Signature";

/// Local name of a SAML assertion element.
pub const ASSERTION: &str = "Assertion";

/// Attribute holding the intended recipient of a message.
pub const DESTINATION: &str = "Destination";

// ============================================================================
// Limits and fixtures
// ============================================================================

/// Status codes at or above this value are HTTP errors.
pub const HTTP_ERROR_THRESHOLD: u16 = 400;

/// Status codes an induced-error Redirect response may carry.
pub const REDIRECT_ERROR_STATUS_CODES: [u16; 3] = [200, 302, 303];

/// Maximum relay state size in bytes (Bindings 3.4.3 and 3.5.3).
pub const DEFAULT_MAX_RELAY_STATE_BYTES: usize = 80;

/// Relay state the test driver sends when a test declares one.
pub const EXAMPLE_RELAY_STATE: &str = "samlconf-relay-state_0123456789";

/// Appended to every violation raised while verifying an induced error.
pub const IDP_ERROR_RESPONSE_REMINDER: &str = "NOTE: The identity provider was driven into an \
    error on purpose. It must still answer with a well-formed SAML error response delivered \
    over the binding, not with an HTTP or transport-level error.";
