//! Storage path handling
//!
//! A storage path is an absolute, `/`-delimited name such as
//! `/alice/stor/photos/cat.jpg`. The first two segments (`/alice` and
//! `/alice/stor`) are account roots owned by the service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of leading segments reserved by the service
pub const RESERVED_DEPTH: usize = 2;

/// An absolute path in the storage namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath(String);

impl StoragePath {
    /// Parse and normalize a storage path.
    ///
    /// Trailing slashes are dropped; empty or relative input is rejected.
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_empty() {
            return Err(Error::Usage("storage path cannot be empty".to_string()));
        }
        if !path.starts_with('/') {
            return Err(Error::Usage(format!("{path}: storage path must be absolute")));
        }

        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self("/".to_string()));
        }
        if trimmed.split('/').skip(1).any(str::is_empty) {
            return Err(Error::Usage(format!("{path}: empty path segment")));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, without the leading empty one
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Number of segments; `/alice/stor` has depth 2
    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    /// Whether the path is an account root that this client must not touch
    pub fn is_reserved(&self) -> bool {
        self.depth() <= RESERVED_DEPTH
    }

    /// The containing directory, or `None` for `/`
    pub fn parent(&self) -> Option<StoragePath> {
        if self.0 == "/" {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self("/".to_string())),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// The last segment, empty for `/`
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Append a single child name
    pub fn join(&self, name: &str) -> Result<StoragePath> {
        if name.is_empty() {
            return Err(Error::Usage(format!("{}: cannot join empty name", self.0)));
        }
        if name.contains('/') {
            return Err(Error::Usage(format!(
                "{}: child name {name:?} contains '/'",
                self.0
            )));
        }
        if self.0 == "/" {
            Self::new(format!("/{name}"))
        } else {
            Self::new(format!("{}/{name}", self.0))
        }
    }

    /// The prefix of this path made of its first `depth` segments.
    ///
    /// `ancestor(self.depth())` is the path itself.
    pub fn ancestor(&self, depth: usize) -> Option<StoragePath> {
        let segments = self.segments();
        if depth > segments.len() {
            return None;
        }
        if depth == 0 {
            return Some(Self("/".to_string()));
        }
        Some(Self(format!("/{}", segments[..depth].join("/"))))
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StoragePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for StoragePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StoragePath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> Self {
        path.0
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
