//! Directory entries and object payloads

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};

/// Default content type for object writes
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirEntryType {
    Directory,
    Object,
}

impl fmt::Display for DirEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirEntryType::Directory => write!(f, "directory"),
            DirEntryType::Object => write!(f, "object"),
        }
    }
}

/// One record of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name, unique within its directory
    pub name: String,

    #[serde(rename = "type")]
    pub entry_type: DirEntryType,

    /// Last modification time
    pub mtime: Timestamp,

    /// Object size in bytes (objects only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Object etag (objects only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl DirEntry {
    /// Create a directory entry
    pub fn directory(name: impl Into<String>, mtime: Timestamp) -> Self {
        Self {
            name: name.into(),
            entry_type: DirEntryType::Directory,
            mtime,
            size: None,
            etag: None,
        }
    }

    /// Create an object entry
    pub fn object(
        name: impl Into<String>,
        mtime: Timestamp,
        size: u64,
        etag: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entry_type: DirEntryType::Object,
            mtime,
            size: Some(size),
            etag,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == DirEntryType::Directory
    }

    /// Parse a single line of a listing body
    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line)
            .map_err(|e| Error::Protocol(format!("invalid directory entry: {line:?} ({e})")))
    }
}

/// One page of a directory listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Entries in service order
    pub entries: Vec<DirEntry>,
    /// Total number of entries in the directory, from `result-set-size`
    pub result_set_size: u64,
}

/// Where the bytes of an object write come from
pub enum ObjectSource {
    /// Inline content
    Bytes(Bytes),
    /// A local file, read in full before the request is sent
    File(PathBuf),
    /// An open byte stream, read to the end before the request is sent
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl ObjectSource {
    /// Pick the single source out of three optional ones.
    ///
    /// Exactly one must be present.
    pub fn exactly_one(
        content: Option<Bytes>,
        path: Option<PathBuf>,
        reader: Option<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> Result<Self> {
        match (content, path, reader) {
            (Some(content), None, None) => Ok(ObjectSource::Bytes(content)),
            (None, Some(path), None) => Ok(ObjectSource::File(path)),
            (None, None, Some(reader)) => Ok(ObjectSource::Reader(reader)),
            _ => Err(Error::Usage(
                "exactly one of content, path or reader must be provided".to_string(),
            )),
        }
    }

    /// Resolve the source into the full payload
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            ObjectSource::Bytes(bytes) => Ok(bytes),
            ObjectSource::File(path) => Ok(Bytes::from(tokio::fs::read(&path).await?)),
            ObjectSource::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl fmt::Debug for ObjectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectSource::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            ObjectSource::File(p) => f.debug_tuple("File").field(p).finish(),
            ObjectSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Bytes> for ObjectSource {
    fn from(bytes: Bytes) -> Self {
        ObjectSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ObjectSource {
    fn from(bytes: Vec<u8>) -> Self {
        ObjectSource::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for ObjectSource {
    fn from(bytes: &'static [u8]) -> Self {
        ObjectSource::Bytes(Bytes::from_static(bytes))
    }
}

/// Options for object writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectOptions {
    pub content_type: String,
    /// Number of copies the service should keep; service default if unset
    pub durability_level: Option<u32>,
}

impl PutObjectOptions {
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn durability_level(mut self, level: u32) -> Self {
        self.durability_level = Some(level);
        self
    }
}

impl Default for PutObjectOptions {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            durability_level: None,
        }
    }
}
