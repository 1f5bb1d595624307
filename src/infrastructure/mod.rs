//! Infrastructure layer.
//!
//! Technical concerns that support the adapter without containing streaming
//! logic: the configuration file and logging setup.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation

pub mod config;
