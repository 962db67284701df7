//! manta-client: HTTP client for the Manta object storage service
//!
//! Two layers:
//! - [`RawClient`] maps each REST endpoint to one method, signs every
//!   request and turns unexpected statuses into typed errors.
//! - [`MantaClient`] adds paged directory aggregation, tree walking,
//!   `mkdir -p` and existence probes on top of the raw calls.
//!
//! ```ignore
//! use std::sync::Arc;
//! use manta_client::{ClientConfig, MantaClient, StoragePath};
//!
//! let config = ClientConfig::builder()
//!     .url("https://us-east.manta.joyent.com")
//!     .user("alice")
//!     .build()?;
//! let client = MantaClient::new(config, Arc::new(my_signer))?;
//!
//! let dir: StoragePath = "/alice/stor/backups/2024".parse()?;
//! client.mkdirp(&dir).await?;
//! client.put(&dir.join("db.tar")?, bytes).await?;
//! ```

pub mod auth;
pub mod client;
pub mod logging;
pub mod raw;
pub mod transport;
pub mod walk;

pub use client::{DirListing, MantaClient};
pub use raw::{RawClient, Request, RequestBody, content_md5};
pub use transport::ReqwestTransport;
pub use walk::{WalkEntry, WalkOrder};

pub use manta_core::{
    ApiError, ClientConfig, DirEntry, DirEntryType, Error, HttpRequest, HttpResponse, ListingPage,
    ObjectSource, PutObjectOptions, Result, Signature, Signer, StoragePath, Transport,
};
