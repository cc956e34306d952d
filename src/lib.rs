//! Container Registry Manager Library
//!
//! This file serves as the library root for the container-registry-manager
//! crate, organizing the modules that make up the application.

pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod region;
pub mod registry;
pub mod scan;

pub use dispatcher::{Dispatcher, OperationRequest, OperationResult, OperationStatus};
pub use error::{Error, Result};
pub use logging::Logger;
