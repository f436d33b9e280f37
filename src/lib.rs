//! Entity predicates: a small query language for selecting catalog entities.
//!
//! # Architecture
//!
//! The workspace is split into a few crates:
//!
//! * `predicate-core`: shared errors, environment configuration and logging
//! * `predicate-grammar`: the predicate data model, validator, loader and HTTP API
//! * `predicate-cli`: the `entity-predicate` command-line tool
//!
//! This facade re-exports the grammar so host applications depend on one crate.

pub use predicate_core::{config, errors, logging, CoreError, PredicateConfig};
pub use predicate_grammar::*;

/// Validates `input` using limits read from the `PREDICATE_*` environment.
///
/// Configuration problems and malformed predicates both come back as
/// [`CoreError`]; use [`CoreError::is_client_error`] to tell them apart.
pub fn validate_with_env(input: &serde_json::Value) -> Result<Predicate, CoreError> {
    let config = PredicateConfig::from_env()?;
    let validator = Validator::new(ValidatorOptions::from(&config));
    Ok(validator.validate(input)?)
}
