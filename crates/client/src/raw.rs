//! Raw REST API client
//!
//! One method per storage service endpoint, no sugar. Each endpoint has a
//! fixed set of success statuses; any other status becomes
//! [`Error::Api`]. See [`crate::MantaClient`] for the conveniences built
//! on top of this.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http::header::{
    ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE, HeaderMap, HeaderName, HeaderValue,
    LOCATION, USER_AGENT,
};
use http::{Method, StatusCode};
use jiff::Timestamp;
use manta_core::{
    ApiError, ClientConfig, DirEntry, Error, HttpRequest, HttpResponse, ListingPage, ObjectSource,
    PutObjectOptions, Result, Signer, StoragePath, Transport,
};

use crate::auth;
use crate::transport::ReqwestTransport;

const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");
const DURABILITY_LEVEL: HeaderName = HeaderName::from_static("x-durability-level");
const RESULT_SET_SIZE: &str = "result-set-size";

const DIRECTORY_CONTENT_TYPE: &str = "application/json; type=directory";
const LINK_CONTENT_TYPE: &str = "application/json; type=link";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body of a raw request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Sent verbatim
    Bytes(Bytes),
    /// Form-url-encoded before sending
    Form(Vec<(String, String)>),
}

/// A request against a storage path, before authentication
#[derive(Debug, Clone)]
pub struct Request {
    pub path: StoragePath,
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl Request {
    pub fn new(method: Method, path: &StoragePath) -> Self {
        Self {
            path: path.clone(),
            method,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// Client for the storage REST API
pub struct RawClient {
    url: String,
    user: String,
    user_agent: String,
    signer: Arc<dyn Signer>,
    transport: Arc<dyn Transport>,
}

impl RawClient {
    /// Create a client that talks HTTP through reqwest
    pub fn new(config: ClientConfig, signer: Arc<dyn Signer>) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::from_config(&config));
        Self::with_transport(config, signer, transport)
    }

    /// Create a client on top of an arbitrary transport
    pub fn with_transport(
        config: ClientConfig,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            user_agent: config.user_agent(),
            url: config.url,
            user: config.user,
            signer,
            transport,
        })
    }

    /// Service base URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Account the client signs requests as
    pub fn user(&self) -> &str {
        &self.user
    }

    fn build_url(&self, path: &StoragePath, query: &[(String, String)]) -> String {
        let encoded_path = path
            .as_str()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let mut url = format!("{}{}", self.url, encoded_path);
        if !query.is_empty() {
            let qs = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            url.push('?');
            url.push_str(&qs);
        }
        url
    }

    /// Authenticate and send a request.
    ///
    /// Sets `User-Agent`, a `Date` unless the caller supplied one, and the
    /// http-signature `Authorization` header over that date. The response
    /// is returned whatever its status.
    pub async fn request(&self, request: Request) -> Result<HttpResponse> {
        let Request {
            path,
            method,
            query,
            mut headers,
            body,
        } = request;

        let url = self.build_url(&path, &query);

        let body = match body {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(bytes) => bytes,
            RequestBody::Form(pairs) => {
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static(FORM_CONTENT_TYPE));
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&pairs)
                    .finish();
                Bytes::from(encoded)
            }
        };

        headers.insert(USER_AGENT, header_value(&self.user_agent)?);

        if !headers.contains_key(DATE) {
            headers.insert(DATE, header_value(&auth::http_date(Timestamp::now()))?);
        }
        let date = headers
            .get(DATE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Usage("Date header must be valid ASCII".to_string()))?
            .to_string();

        let signature = self.signer.sign(&date)?;
        headers.insert(
            AUTHORIZATION,
            header_value(&auth::authorization(&self.user, &signature))?,
        );

        self.transport
            .send(HttpRequest {
                method,
                url,
                headers,
                body,
            })
            .await
    }

    /// PutDirectory: create a directory, succeeding if it already exists
    pub async fn put_directory(&self, dir: &StoragePath) -> Result<()> {
        tracing::debug!(path = %dir, "PutDirectory");
        refuse_reserved(dir, "create")?;

        let request = Request::new(Method::PUT, dir).header(
            CONTENT_TYPE,
            HeaderValue::from_static(DIRECTORY_CONTENT_TYPE),
        );
        let res = self.request(request).await?;
        expect_status(res, &[StatusCode::NO_CONTENT])?;
        Ok(())
    }

    /// ListDirectory returning only the entries
    pub async fn list_directory(
        &self,
        dir: &StoragePath,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<Vec<DirEntry>> {
        Ok(self.list_directory2(dir, limit, marker).await?.entries)
    }

    /// ListDirectory returning the entries and the directory's total size.
    ///
    /// `marker` is inclusive: the first entry of the page is the marker
    /// itself when it still exists.
    pub async fn list_directory2(
        &self,
        dir: &StoragePath,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<ListingPage> {
        tracing::debug!(path = %dir, ?limit, ?marker, "ListDirectory");

        let mut request = Request::new(Method::GET, dir);
        if let Some(limit) = limit {
            request = request.query("limit", limit.to_string());
        }
        if let Some(marker) = marker {
            request = request.query("marker", marker);
        }

        let res = expect_status(self.request(request).await?, &[StatusCode::OK])?;
        let result_set_size = res.header_u64(RESULT_SET_SIZE)?.unwrap_or(0);
        let entries = parse_listing(&res.body)?;

        Ok(ListingPage {
            entries,
            result_set_size,
        })
    }

    /// HEAD on a directory, for its `result-set-size` header
    pub async fn head_directory(&self, dir: &StoragePath) -> Result<HeaderMap> {
        tracing::debug!(path = %dir, "HEAD ListDirectory");
        let res = self.request(Request::new(Method::HEAD, dir)).await?;
        Ok(expect_status(res, &[StatusCode::OK])?.headers)
    }

    /// DeleteDirectory: remove an empty directory
    pub async fn delete_directory(&self, dir: &StoragePath) -> Result<()> {
        tracing::debug!(path = %dir, "DeleteDirectory");
        refuse_reserved(dir, "delete")?;

        let res = self.request(Request::new(Method::DELETE, dir)).await?;
        expect_status(res, &[StatusCode::NO_CONTENT])?;
        Ok(())
    }

    /// PutObject: write an object in one request.
    ///
    /// The whole payload is resolved into memory so that its length and
    /// MD5 can be sent up front.
    pub async fn put_object(
        &self,
        path: &StoragePath,
        source: impl Into<ObjectSource>,
        options: &PutObjectOptions,
    ) -> Result<()> {
        tracing::debug!(path = %path, "PutObject");

        let content = source.into().into_bytes().await?;

        let mut request = Request::new(Method::PUT, path)
            .header(CONTENT_TYPE, header_value(&options.content_type)?)
            .header(CONTENT_LENGTH, HeaderValue::from(content.len()))
            .header(CONTENT_MD5, header_value(&content_md5(&content))?);
        if let Some(level) = options.durability_level {
            request = request.header(DURABILITY_LEVEL, HeaderValue::from(level));
        }

        let res = self
            .request(request.body(RequestBody::Bytes(content)))
            .await?;
        expect_status(res, &[StatusCode::NO_CONTENT])?;
        Ok(())
    }

    /// GetObject: fetch and verify an object's content.
    ///
    /// Returns `None` on `304 Not Modified`: there is no body, and the
    /// caller's cached copy is still current.
    pub async fn get_object(
        &self,
        path: &StoragePath,
        accept: Option<&str>,
    ) -> Result<Option<Bytes>> {
        tracing::debug!(path = %path, "GetObject");

        let request = Request::new(Method::GET, path)
            .header(ACCEPT, header_value(accept.unwrap_or("*/*"))?);
        let res = expect_status(
            self.request(request).await?,
            &[StatusCode::OK, StatusCode::NOT_MODIFIED],
        )?;

        if res.status == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }
        verify_body(&res)?;
        Ok(Some(res.body))
    }

    /// GetObject, writing the verified content to a local file.
    ///
    /// `dest` is left untouched on `304 Not Modified`.
    pub async fn get_object_to_file(
        &self,
        path: &StoragePath,
        dest: impl AsRef<Path>,
        accept: Option<&str>,
    ) -> Result<()> {
        match self.get_object(path, accept).await? {
            Some(content) => tokio::fs::write(dest.as_ref(), &content).await?,
            None => tracing::debug!(path = %path, "not modified, keeping local copy"),
        }
        Ok(())
    }

    /// DeleteObject
    pub async fn delete_object(&self, path: &StoragePath) -> Result<()> {
        tracing::debug!(path = %path, "DeleteObject");
        let res = self.request(Request::new(Method::DELETE, path)).await?;
        expect_status(res, &[StatusCode::NO_CONTENT])?;
        Ok(())
    }

    /// PutLink: make `path` a snaplink to the existing object `target`
    pub async fn put_link(&self, path: &StoragePath, target: &StoragePath) -> Result<()> {
        tracing::debug!(path = %path, target = %target, "PutLink");

        let request = Request::new(Method::PUT, path)
            .header(CONTENT_TYPE, HeaderValue::from_static(LINK_CONTENT_TYPE))
            .header(CONTENT_LENGTH, HeaderValue::from(0u32))
            .header(LOCATION, header_value(target.as_str())?);
        let res = self.request(request).await?;
        expect_status(res, &[StatusCode::NO_CONTENT])?;
        Ok(())
    }
}

/// Base64 of the MD5 digest, as used by `Content-MD5`
pub fn content_md5(content: &[u8]) -> String {
    BASE64.encode(md5::compute(content).0)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::Usage(format!("invalid header value: {value:?}")))
}

fn refuse_reserved(path: &StoragePath, action: &str) -> Result<()> {
    if path.is_reserved() {
        return Err(Error::Usage(format!(
            "{path}: cannot {action} top-level directories"
        )));
    }
    Ok(())
}

fn expect_status(res: HttpResponse, expected: &[StatusCode]) -> Result<HttpResponse> {
    if expected.contains(&res.status) {
        Ok(res)
    } else {
        Err(ApiError::from_response(res.status.as_u16(), &res.body).into())
    }
}

/// Check the body against `content-length` and, when sent, `content-md5`
fn verify_body(res: &HttpResponse) -> Result<()> {
    if let Some(expected) = res.header_u64(CONTENT_LENGTH.as_str())?
        && expected != res.body.len() as u64
    {
        return Err(Error::Integrity(format!(
            "content-length mismatch: expected {expected}, got {}",
            res.body.len()
        )));
    }

    if let Some(expected) = res.header(CONTENT_MD5.as_str())
        && !expected.is_empty()
    {
        let actual = content_md5(&res.body);
        if actual != expected {
            return Err(Error::Integrity(format!(
                "content-md5 mismatch: expected {expected}, got {actual}"
            )));
        }
    }

    Ok(())
}

/// Parse a newline-delimited JSON listing body
fn parse_listing(body: &[u8]) -> Result<Vec<DirEntry>> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::Protocol(format!("directory listing is not UTF-8: {e}")))?;

    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(DirEntry::from_json_line)
        .collect()
}
