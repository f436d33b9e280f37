use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::PredicateError;
use crate::predicate::Predicate;
use crate::validator::Validator;

/// Predicate read from a file, named after the file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedPredicate {
    pub name: String,
    pub predicate: Predicate,
}

/// Reads and validates a single predicate document (`.json`, `.yaml` or `.yml`).
pub fn load_predicate(
    path: impl AsRef<Path>,
    validator: &Validator,
) -> Result<Predicate, PredicateError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PredicateError::MissingPath(path.display().to_string()));
    }
    load_from_file(path, validator)
}

/// Loads a file, or every predicate document in a directory, sorted by name.
pub fn load_predicates(
    path: impl AsRef<Path>,
    validator: &Validator,
) -> Result<Vec<NamedPredicate>, PredicateError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PredicateError::MissingPath(path.display().to_string()));
    }

    let mut predicates = if path.is_dir() {
        load_from_directory(path, validator)?
    } else {
        vec![named(path, load_from_file(path, validator)?)]
    };

    deduplicate(&predicates)?;
    predicates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(predicates)
}

/// Parses in-memory text, trying JSON first and YAML second, then validates it.
pub fn parse_predicate(
    raw: &str,
    origin: impl AsRef<Path>,
    validator: &Validator,
) -> Result<Predicate, PredicateError> {
    let value = parse_document(raw, origin.as_ref())?;
    validator.validate(&value)
}

/// Parses a JSON or YAML document into a plain value without validating it.
pub fn parse_document(raw: &str, origin: &Path) -> Result<Value, PredicateError> {
    let mut attempts = Vec::new();

    match serde_json::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(err) => attempts.push(format!("json: {err}")),
    }

    match serde_yaml::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(err) => attempts.push(format!("yaml: {err}")),
    }

    Err(PredicateError::parse_error(origin, attempts.join("; ")))
}

fn load_from_directory(
    path: &Path,
    validator: &Validator,
) -> Result<Vec<NamedPredicate>, PredicateError> {
    let mut predicates = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| PredicateError::from_io(path, err))? {
        let entry = entry.map_err(|err| PredicateError::from_io(path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| PredicateError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        let entry_path = entry.path();
        if let Some(ext) = entry_path.extension().and_then(|value| value.to_str()) {
            if matches!(ext, "json" | "yaml" | "yml") {
                let predicate = load_from_file(&entry_path, validator)?;
                predicates.push(named(&entry_path, predicate));
            }
        }
    }

    Ok(predicates)
}

fn load_from_file(path: &Path, validator: &Validator) -> Result<Predicate, PredicateError> {
    let raw = fs::read_to_string(path).map_err(|err| PredicateError::from_io(path, err))?;
    debug!(path = %path.display(), "loading predicate document");
    parse_predicate(&raw, path, validator)
}

fn named(path: &Path, predicate: Predicate) -> NamedPredicate {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    NamedPredicate { name, predicate }
}

fn deduplicate(predicates: &[NamedPredicate]) -> Result<(), PredicateError> {
    let mut seen = HashSet::new();
    for predicate in predicates {
        if !seen.insert(predicate.name.as_str()) {
            return Err(PredicateError::DuplicateName {
                name: predicate.name.clone(),
            });
        }
    }
    Ok(())
}
