//! Core types, errors, and configuration for pathwatch.
//!
//! This crate provides the foundational types shared by the watcher and the CLI:
//!
//! - [`Op`] and [`OpSet`] describing file-system operations
//! - Configuration structures ([`Config`], [`WatchConfig`], [`LogConfig`])
//! - [`ConfigError`] for configuration loading and validation

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod op;

pub use config::{Config, LogConfig, WatchConfig};
pub use error::ConfigError;
pub use op::{Op, OpSet};
