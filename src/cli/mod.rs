//! Command line interface module
//!
//! Argument parsing, output emission, and the runner that drives a single
//! invocation end to end.

pub mod args;
pub mod outputs;
pub mod runner;

pub use args::Args;
pub use runner::Runner;
