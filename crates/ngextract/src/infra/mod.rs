//! Infrastructure adapters for configuration, logging, and host integration.

pub mod config;
pub mod host;
pub mod logging;
