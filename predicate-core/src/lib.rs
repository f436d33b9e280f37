//! Core shared library for the entity predicate crates.
//!
//! This crate exposes the ambient pieces every other crate depends on:
//! the canonical error type, environment configuration and logging setup.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{Environment, PredicateConfig, DEFAULT_BIND_ADDRESS, DEFAULT_MAX_DEPTH};
pub use errors::{ConfigError, CoreError, Result as CoreResult};
