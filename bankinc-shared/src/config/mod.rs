//! # Configuration
//!
//! Where the client finds the API, where it keeps the session and how
//! loudly it logs.

pub mod client;

pub use client::{ClientConfig, ConfigError};
