//! Recursive directory traversal

use futures::Stream;
use manta_core::{DirEntry, Result, StoragePath};

use crate::client::{DirListing, MantaClient};

/// When a directory is emitted relative to its subdirectories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkOrder {
    /// A directory is yielded before its subdirectories
    #[default]
    PreOrder,
    /// A directory is yielded after all of its subdirectories
    PostOrder,
}

/// One directory visited by a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub dir_path: StoragePath,
    /// Subdirectory entries
    pub dirs: Vec<DirEntry>,
    /// Object entries
    pub objects: Vec<DirEntry>,
}

impl WalkEntry {
    fn from_listing(dir_path: StoragePath, listing: DirListing) -> Self {
        let (dirs, objects) = listing.into_values().partition(DirEntry::is_dir);
        Self {
            dir_path,
            dirs,
            objects,
        }
    }

    /// Full paths of the subdirectories
    pub fn subdir_paths(&self) -> Result<Vec<StoragePath>> {
        self.dirs
            .iter()
            .map(|d| self.dir_path.join(&d.name))
            .collect()
    }
}

enum Frame {
    Visit(StoragePath),
    Emit(WalkEntry),
}

struct WalkState<'a> {
    client: &'a MantaClient,
    order: WalkOrder,
    stack: Vec<Frame>,
}

pub(crate) fn walk(
    client: &MantaClient,
    top: StoragePath,
    order: WalkOrder,
) -> impl Stream<Item = Result<WalkEntry>> + '_ {
    let state = WalkState {
        client,
        order,
        stack: vec![Frame::Visit(top)],
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            let dir = match state.stack.pop()? {
                Frame::Emit(entry) => return Some((Ok(entry), state)),
                Frame::Visit(dir) => dir,
            };

            let entry = match state.client.ls(&dir).await {
                Ok(listing) => WalkEntry::from_listing(dir, listing),
                Err(e) => {
                    state.stack.clear();
                    return Some((Err(e), state));
                }
            };
            let children = match entry.subdir_paths() {
                Ok(children) => children,
                Err(e) => {
                    state.stack.clear();
                    return Some((Err(e), state));
                }
            };

            match state.order {
                WalkOrder::PreOrder => {
                    state
                        .stack
                        .extend(children.into_iter().rev().map(Frame::Visit));
                    return Some((Ok(entry), state));
                }
                WalkOrder::PostOrder => {
                    state.stack.push(Frame::Emit(entry));
                    state
                        .stack
                        .extend(children.into_iter().rev().map(Frame::Visit));
                }
            }
        }
    })
}
