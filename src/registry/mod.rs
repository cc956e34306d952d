//! Registry backend capability
//!
//! The dispatcher consumes registry operations through the
//! [`RegistryBackend`] trait so the remote API surface stays an opaque
//! collaborator. [`client::IcrClient`] is the concrete implementation
//! against IBM Cloud Container Registry.

pub mod auth;
pub mod client;

use crate::scan::ScanReport;
use async_trait::async_trait;
use thiserror::Error;

pub use client::{IcrClient, IcrClientBuilder};

/// Backend failure, separating transport/auth problems from semantic
/// conditions the dispatcher special-cases.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("registry API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Authenticated registry operations. Implementations are stateless
/// capabilities; connection and token handling are internal to them.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Push a local image to its remote reference, returning the manifest
    /// digest when the remote reported one.
    async fn push(&self, image: &str) -> BackendResult<Option<String>>;

    /// Pull an image, returning its manifest digest when available.
    async fn pull(&self, image: &str) -> BackendResult<Option<String>>;

    /// Tag a local image with a remote reference.
    async fn tag_local(&self, local: &str, image: &str) -> BackendResult<()>;

    /// Add `new_tag` to an existing remote image.
    async fn tag(&self, image: &str, new_tag: &str) -> BackendResult<()>;

    /// Move a tag: `source_tag` on `image` becomes `target_tag`.
    async fn retag(&self, image: &str, source_tag: &str, target_tag: &str) -> BackendResult<()>;

    /// Delete a remote image reference.
    async fn delete_image(&self, image: &str) -> BackendResult<()>;

    async fn create_namespace(&self, name: &str) -> BackendResult<()>;

    async fn delete_namespace(&self, name: &str) -> BackendResult<()>;

    /// Namespaces in the order the remote reports them.
    async fn list_namespaces(&self) -> BackendResult<Vec<String>>;

    /// Request a vulnerability scan for `image`.
    async fn initiate_scan(&self, image: &str) -> BackendResult<()>;

    /// Fetch the current scan report for `image`.
    async fn query_scan(&self, image: &str) -> BackendResult<ScanReport>;
}
