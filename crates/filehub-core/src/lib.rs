//! FileHub Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! validation rules shared by the FileHub API client, the session layer, and
//! the command-line front end.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind, LogLevel};
