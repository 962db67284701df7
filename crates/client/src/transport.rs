//! reqwest-backed transport
//!
//! The underlying `reqwest::Client` is built on first use and then shared
//! by every request made through this transport. Clones share nothing;
//! wrap the transport in an `Arc` to share one connection pool.
//!
//! With `debug` on, every exchange is reported as `req`/`res` events at
//! debug level. Whoever owns the process decides where those go.

use async_trait::async_trait;
use bytes::Bytes;
use manta_core::{ClientConfig, Error, HttpRequest, HttpResponse, Result, Transport};
use tokio::sync::OnceCell;

/// Bodies longer than this are truncated in debug logs
const LOG_BODY_LIMIT: usize = 1024;

/// HTTP transport using reqwest with rustls
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    disable_ssl_certificate_validation: bool,
    debug: bool,
    client: OnceCell<reqwest::Client>,
}

impl ReqwestTransport {
    pub fn new(disable_ssl_certificate_validation: bool) -> Self {
        Self {
            disable_ssl_certificate_validation,
            debug: false,
            client: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.disable_ssl_certificate_validation).debug(config.debug)
    }

    /// Emit `req`/`res` events for every exchange
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn log_wire(&self) -> bool {
        self.debug && tracing::enabled!(tracing::Level::DEBUG)
    }

    async fn client(&self) -> Result<&reqwest::Client> {
        self.client
            .get_or_try_init(|| async {
                if self.disable_ssl_certificate_validation {
                    tracing::warn!("TLS certificate validation is disabled");
                }
                reqwest::Client::builder()
                    .danger_accept_invalid_certs(self.disable_ssl_certificate_validation)
                    // Status codes are checked exactly; never follow redirects.
                    .redirect(reqwest::redirect::Policy::none())
                    .build()
                    .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))
            })
            .await
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let client = self.client().await?;

        if self.log_wire() {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                headers = ?request.headers,
                body = %body_for_log(&request.body),
                "req"
            );
        }

        let method = request.method.clone();
        let url = request.url.clone();
        let response = client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{method} {url}: {e}")))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("{method} {url}: reading body: {e}")))?;

        if self.log_wire() {
            tracing::debug!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                headers = ?headers,
                body = %body_for_log(&body),
                "res"
            );
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Render a body for logging, cut at [`LOG_BODY_LIMIT`] bytes
fn body_for_log(body: &Bytes) -> String {
    if body.len() > LOG_BODY_LIMIT {
        format!("{}...", String::from_utf8_lossy(&body[..LOG_BODY_LIMIT - 3]))
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}
