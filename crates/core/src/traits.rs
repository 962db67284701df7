//! Seams between the client and its collaborators
//!
//! The client never owns credentials or sockets directly. It asks a
//! [`Signer`] for a signature per request and hands the finished request to
//! a [`Transport`]. Both are injected, which keeps the client testable
//! without a network or private keys.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::error::{Error, Result};

/// Output of a [`Signer`] for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Signing algorithm, e.g. `rsa-sha256`
    pub algorithm: String,
    /// Key fingerprint used as the last segment of the key id
    pub fingerprint: String,
    /// Base64 signature over the `Date` header value
    pub signature: String,
}

/// Produces http-signature credentials for a request date
pub trait Signer: Send + Sync {
    /// Sign the exact `Date` header value that will be sent
    fn sign(&self, date: &str) -> Result<Signature>;
}

/// A fully built request, ready to be sent
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including any query string
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A response as returned by the transport
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse a header as an unsigned integer.
    ///
    /// A missing header is `Ok(None)`; a malformed one is a protocol error.
    pub fn header_u64(&self, name: &str) -> Result<Option<u64>> {
        match self.headers.get(name) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Some)
                .ok_or_else(|| Error::Protocol(format!("invalid {name} header: {value:?}"))),
        }
    }
}

/// Executes HTTP requests.
///
/// Connection handling, TLS and caching all live behind this trait. The
/// client performs no retries; a transport may, but none does by default.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
