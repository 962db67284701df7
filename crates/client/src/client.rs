//! High-level client
//!
//! Builds directory aggregation, tree walking, parent-creating mkdir and
//! existence probes out of the raw endpoint calls. Nothing here touches
//! HTTP directly.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use manta_core::{
    ClientConfig, DIRECTORY_DOES_NOT_EXIST, DirEntry, DirEntryType, Error, ObjectSource,
    PutObjectOptions, RESERVED_DEPTH, Result, Signer, StoragePath, Transport,
};

use crate::raw::RawClient;
use crate::walk::{self, WalkEntry, WalkOrder};

/// Name-keyed directory listing
pub type DirListing = BTreeMap<String, DirEntry>;

/// Storage client with convenience operations
pub struct MantaClient {
    raw: RawClient,
}

impl MantaClient {
    /// Create a client that talks HTTP through reqwest
    pub fn new(config: ClientConfig, signer: Arc<dyn Signer>) -> Result<Self> {
        Ok(Self::from_raw(RawClient::new(config, signer)?))
    }

    /// Create a client on top of an arbitrary transport
    pub fn with_transport(
        config: ClientConfig,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self::from_raw(RawClient::with_transport(
            config, signer, transport,
        )?))
    }

    pub fn from_raw(raw: RawClient) -> Self {
        Self { raw }
    }

    /// The underlying endpoint client
    pub fn raw(&self) -> &RawClient {
        &self.raw
    }

    /// List a whole directory, keyed by entry name.
    ///
    /// Pages past the service's per-request cap by re-listing from the last
    /// name seen until `result-set-size` entries have been collected. The
    /// result is not a snapshot: entries added or removed while paging may
    /// be missed or reported stale.
    pub async fn ls(&self, dir: &StoragePath) -> Result<DirListing> {
        let mut dirents = DirListing::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .raw
                .list_directory2(dir, None, marker.as_deref())
                .await?;
            let mut entries = page.entries;
            if marker.is_some() && !entries.is_empty() {
                // The marker is inclusive, so the first entry repeats it.
                entries.remove(0);
            }

            let Some(last) = entries.last() else {
                break;
            };
            let next_marker = last.name.clone();

            let before = dirents.len();
            for entry in entries {
                dirents.insert(entry.name.clone(), entry);
            }

            if dirents.len() as u64 >= page.result_set_size {
                break;
            }
            if dirents.len() == before {
                tracing::warn!(
                    path = %dir,
                    collected = dirents.len(),
                    result_set_size = page.result_set_size,
                    "listing stopped making progress"
                );
                break;
            }
            marker = Some(next_marker);
        }

        Ok(dirents)
    }

    /// A single listing page keyed by name, without paging
    pub async fn ls_page(
        &self,
        dir: &StoragePath,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<DirListing> {
        let entries = self.raw.list_directory(dir, limit, marker).await?;
        Ok(entries.into_iter().map(|e| (e.name.clone(), e)).collect())
    }

    /// Walk the tree under `top`, one item per directory.
    ///
    /// The stream is lazy: each directory is listed only when the stream
    /// reaches it. A failed listing is yielded as an error and ends the
    /// walk. Calling `walk` again starts a fresh traversal.
    pub fn walk<'a>(
        &'a self,
        top: &StoragePath,
        order: WalkOrder,
    ) -> impl Stream<Item = Result<WalkEntry>> + use<'a> {
        walk::walk(self, top.clone(), order)
    }

    /// Create a directory.
    ///
    /// Creating an existing directory succeeds. With `parents`, missing
    /// ancestors are created too, like `mkdir -p`.
    pub async fn mkdir(&self, dir: &StoragePath, parents: bool) -> Result<()> {
        if dir.depth() <= RESERVED_DEPTH {
            return Err(Error::Usage(format!("{dir}: cannot create top-level dirs")));
        }
        if !parents {
            return self.raw.put_directory(dir).await;
        }

        // PutDirectory succeeds on an existing directory and fails with
        // DirectoryDoesNotExist when the parent is missing, so probing a
        // prefix tells us which side of the "first missing dir" boundary
        // it is on. `start` is the deepest prefix known to exist, `end` the
        // shallowest known to fail.
        let depth = dir.depth();
        let mut start = RESERVED_DEPTH;
        let mut end = depth + 1;

        while start < end - 1 {
            let mid = start + (end - start) / 2;
            let probe = ancestor(dir, mid)?;
            match self.raw.put_directory(&probe).await {
                Ok(()) => start = mid,
                Err(e) if e.api_code() == Some(DIRECTORY_DOES_NOT_EXIST) => end = mid,
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(path = %dir, existing_depth = start, "creating missing directories");
        for level in end..=depth {
            self.raw.put_directory(&ancestor(dir, level)?).await?;
        }

        Ok(())
    }

    /// `mkdir -p`
    pub async fn mkdirp(&self, dir: &StoragePath) -> Result<()> {
        self.mkdir(dir, true).await
    }

    /// Directory entry for a path, found by listing its parent
    pub async fn stat(&self, path: &StoragePath) -> Result<DirEntry> {
        if path.depth() <= RESERVED_DEPTH {
            return Err(Error::Usage(format!("cannot stat special path: {path}")));
        }

        let parent = path
            .parent()
            .ok_or_else(|| Error::Usage(format!("cannot stat special path: {path}")))?;
        let mut dirents = self.ls(&parent).await?;

        dirents
            .remove(path.name())
            .ok_or_else(|| Error::NotFound(format!("{path}: no such object or directory")))
    }

    /// The entry type of a path, or `None` if it does not exist
    pub async fn type_of(&self, path: &StoragePath) -> Result<Option<DirEntryType>> {
        match self.stat(path).await {
            Ok(entry) => Ok(Some(entry.entry_type)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch an object's content.
    ///
    /// The read is unconditional, so a `304 Not Modified` answer carries no
    /// usable content and is reported as a protocol error.
    pub async fn get(&self, path: &StoragePath) -> Result<Bytes> {
        self.raw
            .get_object(path, None)
            .await?
            .ok_or_else(|| Error::Protocol(format!("{path}: unexpected 304 Not Modified")))
    }

    /// Fetch an object into a local file
    pub async fn get_to_file(&self, path: &StoragePath, dest: impl AsRef<Path>) -> Result<()> {
        self.raw.get_object_to_file(path, dest, None).await
    }

    /// Write an object with default options
    pub async fn put(&self, path: &StoragePath, source: impl Into<ObjectSource>) -> Result<()> {
        self.raw
            .put_object(path, source, &PutObjectOptions::default())
            .await
    }

    /// Delete an object
    pub async fn rm(&self, path: &StoragePath) -> Result<()> {
        self.raw.delete_object(path).await
    }

    /// Delete an empty directory
    pub async fn rmdir(&self, dir: &StoragePath) -> Result<()> {
        self.raw.delete_directory(dir).await
    }
}

fn ancestor(path: &StoragePath, depth: usize) -> Result<StoragePath> {
    path.ancestor(depth)
        .ok_or_else(|| Error::Usage(format!("{path}: no ancestor at depth {depth}")))
}
