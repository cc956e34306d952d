//! Error taxonomy for registry lifecycle operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing input, caught before any remote call is made
    #[error("Validation error: {0}")]
    Validation(String),
    /// Region inference failed and no explicit region was given
    #[error(
        "Unable to determine a registry region for '{0}': unknown registry host; \
         pass an explicit region"
    )]
    RegionUnresolved(String),
    /// The scan could not even be started; never retried
    #[error("Failed to initiate vulnerability scan: {0}")]
    ScanInitiationFailed(String),
    /// Polling ceiling exhausted while the scan was still in progress
    #[error("Vulnerability scan did not complete after {attempts} polls (last status: {last_status})")]
    ScanTimedOut { attempts: u32, last_status: String },
    #[error("Source tag not found: {0}")]
    TagNotFound(String),
    #[error("Image not found: {0}")]
    ImageNotFound(String),
    /// Catch-all for transport/auth/unexpected remote errors
    #[error("Registry operation failed: {0}")]
    RemoteOperationFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
