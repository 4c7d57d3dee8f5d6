//! HTTP-Redirect Binding implementation.
//!
//! Reverses the SAML 2.0 HTTP-Redirect binding: reads the SAML parameters
//! from the `Location` query string and undoes the URL, base64 and DEFLATE
//! encodings, in that order.

use std::io::{Read, Write};

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::constants::{
    DEFLATE_ENCODING, LOCATION, RELAY_STATE, SAML_ENCODING, SAML_RESPONSE, SIGNATURE_PARAM, SIG_ALG,
};
use crate::context::HttpResponseView;

use super::{Carrier, DecodeError, DecodeStage, ExtractedMessage};

/// Base used to resolve relative `Location` headers.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// The redirect URL that carried a SAML response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCarrier {
    /// The `Location` header value.
    pub location: Option<String>,
    /// Whether the location parses as a URL with a non-empty path.
    pub has_path: bool,
    /// Whether the location has a non-empty query string.
    pub has_parameters: bool,
    /// The decoded `SAMLEncoding` parameter.
    pub saml_encoding: Option<String>,
    /// The still-encoded `Signature` parameter.
    pub signature: Option<String>,
    /// The decoded `SigAlg` parameter.
    pub sig_alg: Option<String>,
}

/// HTTP-Redirect binding decoder/encoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Extracts the SAML parameters from the response's `Location` header.
    ///
    /// `SAMLResponse` and `Signature` are returned exactly as transmitted so
    /// that [`decode`](Self::decode) sees every encoding stage; the other
    /// parameters are form-decoded. The first occurrence of a parameter wins
    /// and empty values count as absent.
    #[must_use]
    pub fn extract(response: &HttpResponseView) -> ExtractedMessage {
        let Some(location) = response.header(LOCATION) else {
            return ExtractedMessage {
                encoded_payload: None,
                relay_state: None,
                carrier: Carrier::Query(QueryCarrier::default()),
            };
        };

        let has_path = url::Url::parse(location)
            .or_else(|_| url::Url::parse(RELATIVE_BASE).and_then(|base| base.join(location)))
            .is_ok_and(|url| !url.path().is_empty());

        let query = raw_query(location);
        let mut params = QueryParams::default();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            params.record(pair);
        }

        ExtractedMessage {
            encoded_payload: params.saml_response,
            relay_state: params.relay_state,
            carrier: Carrier::Query(QueryCarrier {
                location: Some(location.to_string()),
                has_path,
                has_parameters: !query.is_empty(),
                saml_encoding: params.saml_encoding,
                signature: params.signature,
                sig_alg: params.sig_alg,
            }),
        }
    }

    /// Decodes a Redirect-encoded SAML message.
    ///
    /// Only the DEFLATE encoding is supported; `saml_encoding` of `None`
    /// means DEFLATE. The stages run in a fixed order and the first failure
    /// is reported:
    ///
    /// 1. reject any whitespace ([`DecodeStage::WhitespaceDetected`])
    /// 2. URL decode ([`DecodeStage::UrlDecode`])
    /// 3. base64 decode ([`DecodeStage::Base64Decode`])
    /// 4. raw DEFLATE inflate to UTF-8 ([`DecodeStage::Inflate`])
    pub fn decode(encoded: &str, saml_encoding: Option<&str>) -> Result<String, DecodeError> {
        if let Some(encoding) = saml_encoding.filter(|encoding| *encoding != DEFLATE_ENCODING) {
            return Err(DecodeError::UnsupportedEncoding(encoding.to_string()));
        }

        if let Some(position) = encoded.find(char::is_whitespace) {
            return Err(DecodeError::stage(
                DecodeStage::WhitespaceDetected,
                format!("linefeed or whitespace at byte {position}"),
            ));
        }

        let url_decoded = url_decode(encoded)?;

        let compressed = base64::engine::general_purpose::STANDARD
            .decode(url_decoded.as_bytes())
            .map_err(|e| DecodeError::stage(DecodeStage::Base64Decode, e.to_string()))?;

        let inflated = deflate_decompress(&compressed)?;

        String::from_utf8(inflated).map_err(|e| {
            DecodeError::stage(
                DecodeStage::Inflate,
                format!("invalid UTF-8 in inflated message: {e}"),
            )
        })
    }

    /// Deflates, base64-encodes and URL-encodes a SAML message.
    pub fn encode_message(xml: &str) -> std::io::Result<String> {
        let compressed = deflate_compress(xml.as_bytes())?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(compressed);
        Ok(urlencoding::encode(&encoded).into_owned())
    }

    /// Encodes a SAML response as a redirect URL.
    pub fn encode_response(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
    ) -> std::io::Result<String> {
        let separator = if destination.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{destination}{separator}{SAML_RESPONSE}={}",
            Self::encode_message(xml)?
        );

        if let Some(rs) = relay_state {
            url.push_str(&format!("&{RELAY_STATE}={}", urlencoding::encode(rs)));
        }

        Ok(url)
    }
}

#[derive(Default)]
struct QueryParams {
    saml_response: Option<String>,
    relay_state: Option<String>,
    saml_encoding: Option<String>,
    signature: Option<String>,
    sig_alg: Option<String>,
}

impl QueryParams {
    fn record(&mut self, pair: &str) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        if raw_value.is_empty() {
            return;
        }
        let Some((key, value)) = url::form_urlencoded::parse(pair.as_bytes()).next() else {
            return;
        };

        let slot = match &*key {
            SAML_RESPONSE => {
                fill(&mut self.saml_response, raw_value);
                return;
            }
            SIGNATURE_PARAM => {
                fill(&mut self.signature, raw_value);
                return;
            }
            RELAY_STATE => &mut self.relay_state,
            SAML_ENCODING => &mut self.saml_encoding,
            SIG_ALG => &mut self.sig_alg,
            _ => {
                tracing::trace!(parameter = raw_key, "ignoring query parameter");
                return;
            }
        };
        fill(slot, &value);
    }
}

fn fill(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

/// Returns the query string of a URL, without the fragment.
pub(super) fn raw_query(location: &str) -> &str {
    location
        .split_once('?')
        .map_or("", |(_, rest)| rest.split('#').next().unwrap_or(""))
}

/// Percent-decodes a value, rejecting malformed escapes and non-UTF-8 output.
fn url_decode(encoded: &str) -> Result<String, DecodeError> {
    let bytes = encoded.as_bytes();
    for (index, _) in encoded.match_indices('%') {
        let escape = bytes.get(index + 1..index + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            return Err(DecodeError::stage(
                DecodeStage::UrlDecode,
                format!("malformed percent-escape at byte {index}"),
            ));
        }
    }

    urlencoding::decode(encoded)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| DecodeError::stage(DecodeStage::UrlDecode, e.to_string()))
}

/// Compresses data using DEFLATE (raw, no zlib header).
fn deflate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompresses raw DEFLATE data.
fn deflate_decompress(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::stage(DecodeStage::Inflate, e.to_string()))?;
    Ok(decompressed)
}
