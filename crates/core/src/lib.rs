//! manta-core: Core library for the Manta object storage client
//!
//! This crate provides the transport-independent pieces of the client:
//! - Error taxonomy shared by every operation
//! - Storage path parsing and validation
//! - Directory entries and object payload sources
//! - `Signer` and `Transport` traits the HTTP client is built on
//! - Client configuration
//!
//! It knows nothing about a concrete HTTP library, so the request logic
//! in `manta-client` can be tested against in-memory transports.

pub mod config;
pub mod error;
pub mod path;
pub mod traits;
pub mod types;

pub use config::{ClientConfig, ClientConfigBuilder, default_user_agent};
pub use error::{ApiError, DIRECTORY_DOES_NOT_EXIST, Error, RESOURCE_NOT_FOUND, Result};
pub use path::{RESERVED_DEPTH, StoragePath};
pub use traits::{HttpRequest, HttpResponse, Signature, Signer, Transport};
pub use types::{
    DEFAULT_CONTENT_TYPE, DirEntry, DirEntryType, ListingPage, ObjectSource, PutObjectOptions,
};
