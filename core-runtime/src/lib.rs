//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the video platform core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! Every other core crate logs through `tracing` and is configured from the
//! [`CoreConfig`](config::CoreConfig) built here.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FreshnessConfig};
pub use error::{Error, Result};
