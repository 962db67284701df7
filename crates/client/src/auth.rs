//! http-signature request authentication

use jiff::Timestamp;
use manta_core::Signature;

/// Format a timestamp as an HTTP-date (RFC 1123, always GMT)
pub fn http_date(ts: Timestamp) -> String {
    ts.strftime("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the `Authorization` header value for a signed request
pub fn authorization(user: &str, signature: &Signature) -> String {
    format!(
        "Signature keyId=\"/{}/keys/{}\",algorithm=\"{}\" {}",
        user, signature.fingerprint, signature.algorithm, signature.signature
    )
}
