//! In-memory storage service used by the integration tests
//!
//! Implements `Transport` directly, so the real request construction,
//! signing and response handling of the client are exercised end to end
//! without a network.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use jiff::Timestamp;
use manta_client::{
    ClientConfig, DirEntry, HttpRequest, HttpResponse, MantaClient, Result, Signature, Signer,
    StoragePath, Transport, content_md5,
};

pub const BASE_URL: &str = "https://manta.test";
pub const USER: &str = "alice";
const MTIME: &str = "2024-01-01T00:00:00Z";

/// Signer returning a fixed signature
pub struct StaticSigner;

impl Signer for StaticSigner {
    fn sign(&self, _date: &str) -> Result<Signature> {
        Ok(Signature {
            algorithm: "rsa-sha256".to_string(),
            fingerprint: "00:11:22:33".to_string(),
            signature: "c2lnbmF0dXJl".to_string(),
        })
    }
}

/// How the fake corrupts object reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tamper {
    #[default]
    None,
    /// Advertise a longer content-length than the body
    Length,
    /// Advertise a content-md5 that does not match the body
    Md5,
}

/// How the fake misreports directory listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Listing {
    #[default]
    Accurate,
    /// Advertise this many entries in `result-set-size`
    ReportSize(usize),
    /// Ignore `marker` and always list from the first entry
    IgnoreMarker,
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    Object { data: Bytes, content_type: String },
}

/// A request as seen by the fake
#[derive(Debug, Clone)]
pub struct Logged {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
}

pub struct FakeManta {
    nodes: Mutex<BTreeMap<String, Node>>,
    log: Mutex<Vec<Logged>>,
    page_size: usize,
    tamper: Mutex<Tamper>,
    listing: Mutex<Listing>,
}

impl FakeManta {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(format!("/{USER}"), Node::Dir);
        nodes.insert(format!("/{USER}/stor"), Node::Dir);
        Self {
            nodes: Mutex::new(nodes),
            log: Mutex::new(Vec::new()),
            page_size,
            tamper: Mutex::new(Tamper::None),
            listing: Mutex::new(Listing::Accurate),
        }
    }

    /// Seed a directory, creating missing parents
    pub fn add_dir(&self, path: &str) {
        let mut nodes = self.nodes.lock().unwrap();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            nodes.entry(current.clone()).or_insert(Node::Dir);
        }
    }

    /// Seed an object, creating missing parent directories
    pub fn add_object(&self, path: &str, data: &[u8]) {
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.add_dir(parent);
        }
        self.nodes.lock().unwrap().insert(
            path.to_string(),
            Node::Object {
                data: Bytes::copy_from_slice(data),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.lock().unwrap().get(path), Some(Node::Dir))
    }

    pub fn object(&self, path: &str) -> Option<Bytes> {
        match self.nodes.lock().unwrap().get(path) {
            Some(Node::Object { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// All directory paths currently stored
    pub fn dirs(&self) -> Vec<String> {
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, n)| matches!(n, Node::Dir))
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn set_tamper(&self, tamper: Tamper) {
        *self.tamper.lock().unwrap() = tamper;
    }

    pub fn set_listing(&self, listing: Listing) {
        *self.listing.lock().unwrap() = listing;
    }

    pub fn requests(&self) -> Vec<Logged> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub fn clear_requests(&self) {
        self.log.lock().unwrap().clear();
    }

    fn children(nodes: &BTreeMap<String, Node>, dir: &str) -> Vec<(String, Node)> {
        let prefix = format!("{dir}/");
        nodes
            .iter()
            .filter_map(|(path, node)| {
                let name = path.strip_prefix(&prefix)?;
                if name.contains('/') {
                    None
                } else {
                    Some((name.to_string(), node.clone()))
                }
            })
            .collect()
    }

    fn parent_of(path: &str) -> &str {
        match path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &path[..idx],
        }
    }

    fn handle(
        &self,
        method: &Method,
        path: &str,
        query: &[(String, String)],
        req: &HttpRequest,
    ) -> HttpResponse {
        let mut nodes = self.nodes.lock().unwrap();
        let content_type = req
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        match *method {
            Method::PUT if content_type == "application/json; type=directory" => {
                match nodes.get(path) {
                    Some(Node::Dir) => return empty(StatusCode::NO_CONTENT),
                    Some(Node::Object { .. }) => {
                        return error(StatusCode::BAD_REQUEST, "ParentNotDirectory", path);
                    }
                    None => {}
                }
                if !matches!(nodes.get(Self::parent_of(path)), Some(Node::Dir)) {
                    return error(
                        StatusCode::NOT_FOUND,
                        "DirectoryDoesNotExist",
                        &format!("{} does not exist", Self::parent_of(path)),
                    );
                }
                nodes.insert(path.to_string(), Node::Dir);
                empty(StatusCode::NO_CONTENT)
            }
            Method::PUT if content_type == "application/json; type=link" => {
                let target = req
                    .headers
                    .get("location")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                let Some(node @ Node::Object { .. }) = nodes.get(target).cloned() else {
                    return error(StatusCode::NOT_FOUND, "SourceObjectNotFound", target);
                };
                if !matches!(nodes.get(Self::parent_of(path)), Some(Node::Dir)) {
                    return error(StatusCode::NOT_FOUND, "DirectoryDoesNotExist", path);
                }
                nodes.insert(path.to_string(), node);
                empty(StatusCode::NO_CONTENT)
            }
            Method::PUT => {
                if !matches!(nodes.get(Self::parent_of(path)), Some(Node::Dir)) {
                    return error(StatusCode::NOT_FOUND, "DirectoryDoesNotExist", path);
                }
                let sent_md5 = req
                    .headers
                    .get("content-md5")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if sent_md5 != content_md5(&req.body) {
                    return error(StatusCode::BAD_REQUEST, "ContentMD5Mismatch", path);
                }
                let sent_len = req
                    .headers
                    .get("content-length")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<usize>().ok());
                if sent_len != Some(req.body.len()) {
                    return error(StatusCode::BAD_REQUEST, "BadRequest", "content-length");
                }
                nodes.insert(
                    path.to_string(),
                    Node::Object {
                        data: req.body.clone(),
                        content_type,
                    },
                );
                empty(StatusCode::NO_CONTENT)
            }
            Method::GET | Method::HEAD => match nodes.get(path) {
                None => error(StatusCode::NOT_FOUND, "ResourceNotFound", path),
                Some(Node::Dir) => self.list(&nodes, method, path, query),
                Some(Node::Object { data, content_type }) => {
                    let tamper = *self.tamper.lock().unwrap();
                    let length = match tamper {
                        Tamper::Length => data.len() + 5,
                        _ => data.len(),
                    };
                    let md5 = match tamper {
                        Tamper::Md5 => content_md5(b"something else"),
                        _ => content_md5(data),
                    };
                    let mut headers = HeaderMap::new();
                    headers.insert("content-length", HeaderValue::from(length));
                    headers.insert("content-md5", HeaderValue::from_str(&md5).unwrap());
                    headers.insert("content-type", HeaderValue::from_str(content_type).unwrap());
                    HttpResponse {
                        status: StatusCode::OK,
                        headers,
                        body: data.clone(),
                    }
                }
            },
            Method::DELETE => match nodes.get(path) {
                None => error(StatusCode::NOT_FOUND, "ResourceNotFound", path),
                Some(Node::Dir) => {
                    if !Self::children(&nodes, path).is_empty() {
                        return error(StatusCode::BAD_REQUEST, "DirectoryNotEmpty", path);
                    }
                    nodes.remove(path);
                    empty(StatusCode::NO_CONTENT)
                }
                Some(Node::Object { .. }) => {
                    nodes.remove(path);
                    empty(StatusCode::NO_CONTENT)
                }
            },
            _ => error(
                StatusCode::METHOD_NOT_ALLOWED,
                "BadRequest",
                method.as_str(),
            ),
        }
    }

    fn list(
        &self,
        nodes: &BTreeMap<String, Node>,
        method: &Method,
        dir: &str,
        query: &[(String, String)],
    ) -> HttpResponse {
        let children = Self::children(nodes, dir);
        let listing = *self.listing.lock().unwrap();
        let total = match listing {
            Listing::ReportSize(size) => size,
            _ => children.len(),
        };

        let limit = query
            .iter()
            .find(|(k, _)| k == "limit")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .map_or(self.page_size, |l| l.min(self.page_size));
        let marker = query
            .iter()
            .find(|(k, _)| k == "marker")
            .map(|(_, v)| v.as_str())
            .filter(|_| listing != Listing::IgnoreMarker);
        let mtime: Timestamp = MTIME.parse().unwrap();

        let mut body = String::new();
        for (name, node) in children
            .iter()
            .filter(|(name, _)| marker.is_none_or(|m| name.as_str() >= m))
            .take(limit)
        {
            let entry = match node {
                Node::Dir => DirEntry::directory(name.as_str(), mtime),
                Node::Object { data, .. } => DirEntry::object(
                    name.as_str(),
                    mtime,
                    data.len() as u64,
                    Some(content_md5(data)),
                ),
            };
            body.push_str(&serde_json::to_string(&entry).unwrap());
            body.push('\n');
        }

        let mut headers = HeaderMap::new();
        headers.insert("result-set-size", HeaderValue::from(total));
        HttpResponse {
            status: StatusCode::OK,
            headers,
            body: if *method == Method::HEAD {
                Bytes::new()
            } else {
                Bytes::from(body)
            },
        }
    }
}

#[async_trait]
impl Transport for FakeManta {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let rest = request
            .url
            .strip_prefix(BASE_URL)
            .expect("request for another service");
        let (raw_path, raw_query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = urlencoding::decode(raw_path).unwrap().into_owned();
        let query: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.as_bytes())
            .into_owned()
            .collect();

        self.log.lock().unwrap().push(Logged {
            method: request.method.clone(),
            path: path.clone(),
            query: query.clone(),
            headers: request.headers.clone(),
        });

        let authorized = request.headers.contains_key("date")
            && request
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with(&format!("Signature keyId=\"/{USER}/keys/")));
        if !authorized {
            return Ok(error(
                StatusCode::UNAUTHORIZED,
                "InvalidSignature",
                "unsigned",
            ));
        }

        Ok(self.handle(&request.method, &path, &query, &request))
    }
}

fn empty(status: StatusCode) -> HttpResponse {
    HttpResponse {
        status,
        headers: HeaderMap::new(),
        body: Bytes::new(),
    }
}

fn error(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "code": code, "message": message }).to_string();
    HttpResponse {
        status,
        headers: HeaderMap::new(),
        body: Bytes::from(body),
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::builder()
        .url(BASE_URL)
        .user(USER)
        .build()
        .unwrap()
}

pub fn client(fake: &Arc<FakeManta>) -> MantaClient {
    MantaClient::with_transport(config(), Arc::new(StaticSigner), fake.clone()).unwrap()
}

pub fn path(s: &str) -> StoragePath {
    s.parse().unwrap()
}
