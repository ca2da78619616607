//! gemini-relay - single-endpoint chat relay for the Gemini API
//!
//! This library provides the configuration, upstream client and HTTP
//! service behind the `gemini-relay` binary.

pub mod config;
pub mod error;
pub mod relay;
pub mod upstream;

pub use config::Config;
pub use error::{Error, Result};
