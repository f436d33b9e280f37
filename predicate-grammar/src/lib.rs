//! Grammar and validator for entity selection predicates.
//!
//! A predicate selects catalog entities by field value, operator or boolean
//! combination:
//!
//! ```json
//! { "$or": [
//!     { "kind": "component", "spec.type": { "$in": ["service", "website"] } },
//!     { "$not": { "metadata.tags": { "$contains": "deprecated" } } }
//! ] }
//! ```
//!
//! This crate only decides whether such a value is well formed. Accepted
//! predicates serialize back to exactly the input and are handed to whatever
//! evaluates them against real entities.

mod error;
mod field_path;
mod loader;
mod pick;
mod predicate;
mod service;
mod validator;

pub use error::{PredicateError, Violation};
pub use field_path::FieldPath;
pub use loader::{load_predicate, load_predicates, parse_document, parse_predicate, NamedPredicate};
pub use pick::{pick, pick_owned};
pub use predicate::{
    keys, ContainsValue, FieldConditions, FieldOperator, FieldValue, Predicate, Scalar,
};
pub use service::{ErrorResponse, PredicateApiBuilder, ServiceConfig, ValidationResponse};
pub use validator::{validate, validate_str, Validator, ValidatorOptions};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn validates_simple_predicate() {
        let input = json!({"metadata.tags": {"$in": ["java"]}});
        let predicate = validate(&input).expect("predicate should be accepted");
        assert_eq!(predicate.field_paths()[0].as_str(), "metadata.tags");
        assert_eq!(Value::from(&predicate), input);
    }
}
