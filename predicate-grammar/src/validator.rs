use predicate_core::{PredicateConfig, DEFAULT_MAX_DEPTH};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{PredicateError, Violation};
use crate::field_path::FieldPath;
use crate::predicate::{
    keys, ContainsValue, FieldConditions, FieldOperator, FieldValue, Predicate, Scalar,
};

/// Tunables for [`Validator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Deepest predicate nesting accepted; the root node counts as depth 1.
    /// [`Validator::new`] raises anything below 1 to 1.
    pub max_depth: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl From<&PredicateConfig> for ValidatorOptions {
    fn from(config: &PredicateConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }
}

/// Recursive-descent checker for the predicate grammar.
///
/// Holds no state between calls; a single value can be shared freely across
/// threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    options: ValidatorOptions,
}

/// Validates `input` with the default options.
pub fn validate(input: &Value) -> Result<Predicate, PredicateError> {
    Validator::default().validate(input)
}

/// Parses JSON text and validates the result with the default options.
pub fn validate_str(raw: &str) -> Result<Predicate, PredicateError> {
    Validator::default().validate_str(raw)
}

#[derive(Debug)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Location of the node currently being checked.
#[derive(Debug, Default)]
struct Trail<'a>(Vec<Segment<'a>>);

impl<'a> Trail<'a> {
    fn key(&mut self, key: &'a str) {
        self.0.push(Segment::Key(key));
    }

    fn index(&mut self, index: usize) {
        self.0.push(Segment::Index(index));
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn render(&self) -> String {
        if self.0.is_empty() {
            return "<root>".to_string();
        }
        let mut rendered = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(key);
                }
                Segment::Index(index) => rendered.push_str(&format!("[{index}]")),
            }
        }
        rendered
    }

    fn reject<T>(&self, reason: Violation) -> Result<T, PredicateError> {
        Err(PredicateError::malformed(self.render(), reason))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Validator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            options: ValidatorOptions {
                max_depth: options.max_depth.max(1),
            },
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::new(ValidatorOptions { max_depth })
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Classifies `input` against the grammar.
    ///
    /// Acceptance returns a predicate whose [`Predicate::to_value`] equals
    /// `input`; the first mismatch anywhere in the tree rejects the whole
    /// value.
    pub fn validate(&self, input: &Value) -> Result<Predicate, PredicateError> {
        let mut trail = Trail::default();
        match self.predicate(input, 1, &mut trail) {
            Ok(predicate) => {
                trace!(depth = predicate.depth(), "predicate accepted");
                Ok(predicate)
            }
            Err(err) => {
                debug!(error = %err, "predicate rejected");
                Err(err)
            }
        }
    }

    pub fn validate_str(&self, raw: &str) -> Result<Predicate, PredicateError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| PredicateError::Syntax(err.to_string()))?;
        self.validate(&value)
    }

    fn predicate<'v>(
        &self,
        value: &'v Value,
        depth: usize,
        trail: &mut Trail<'v>,
    ) -> Result<Predicate, PredicateError> {
        if depth > self.options.max_depth {
            return trail.reject(Violation::DepthExceeded {
                max: self.options.max_depth,
            });
        }

        let map = match value {
            Value::Object(map) => map,
            other => {
                return trail.reject(Violation::NotAnObject {
                    found: kind_of(other),
                })
            }
        };

        match map
            .iter()
            .find(|(key, _)| keys::COMBINATORS.contains(&key.as_str()))
        {
            Some((key, operand)) => self.combinator(map, key, operand, depth, trail),
            None => self.fields(map, depth, trail).map(Predicate::Fields),
        }
    }

    fn combinator<'v>(
        &self,
        map: &'v Map<String, Value>,
        key: &'v str,
        operand: &'v Value,
        depth: usize,
        trail: &mut Trail<'v>,
    ) -> Result<Predicate, PredicateError> {
        if map.len() != 1 {
            return trail.reject(Violation::MixedCombinator {
                combinator: key.to_string(),
            });
        }

        trail.key(key);
        let node = match key {
            keys::AND => Predicate::And(self.branches(key, operand, depth, trail)?),
            keys::OR => Predicate::Or(self.branches(key, operand, depth, trail)?),
            _ => Predicate::Not(Box::new(self.predicate(operand, depth + 1, trail)?)),
        };
        trail.pop();
        Ok(node)
    }

    fn branches<'v>(
        &self,
        key: &str,
        operand: &'v Value,
        depth: usize,
        trail: &mut Trail<'v>,
    ) -> Result<Vec<Predicate>, PredicateError> {
        let items = match operand {
            Value::Array(items) => items,
            _ => {
                return trail.reject(Violation::CombinatorNotArray {
                    combinator: key.to_string(),
                })
            }
        };
        if items.is_empty() {
            return trail.reject(Violation::EmptyCombinator {
                combinator: key.to_string(),
            });
        }

        let mut branches = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            trail.index(index);
            branches.push(self.predicate(item, depth + 1, trail)?);
            trail.pop();
        }
        Ok(branches)
    }

    fn fields<'v>(
        &self,
        map: &'v Map<String, Value>,
        depth: usize,
        trail: &mut Trail<'v>,
    ) -> Result<FieldConditions, PredicateError> {
        let mut conditions = FieldConditions::new();
        for (key, value) in map {
            let path = match FieldPath::parse(key.as_str()) {
                Ok(path) => path,
                Err(reason) => return trail.reject(reason),
            };
            trail.key(key);
            conditions.push(path, self.field_value(value, depth, trail)?);
            trail.pop();
        }
        Ok(conditions)
    }

    fn field_value<'v>(
        &self,
        value: &'v Value,
        depth: usize,
        trail: &mut Trail<'v>,
    ) -> Result<FieldValue, PredicateError> {
        match value {
            Value::Null => trail.reject(Violation::NullValue),
            Value::Array(items) => scalar_list(items, trail).map(FieldValue::LiteralArray),
            Value::Object(map) => self.operator(map, depth, trail).map(FieldValue::Operator),
            scalar => match Scalar::from_value(scalar) {
                Some(scalar) => Ok(FieldValue::Literal(scalar)),
                None => trail.reject(Violation::NullValue),
            },
        }
    }

    fn operator<'v>(
        &self,
        map: &'v Map<String, Value>,
        depth: usize,
        trail: &mut Trail<'v>,
    ) -> Result<FieldOperator, PredicateError> {
        let mut entries = map.iter();
        let (key, operand) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => return trail.reject(Violation::OperatorArity { count: map.len() }),
        };

        trail.key(key);
        let operator = match key.as_str() {
            keys::EQ => FieldOperator::Eq(scalar_operand(keys::EQ, operand, trail)?),
            keys::NE => FieldOperator::Ne(scalar_operand(keys::NE, operand, trail)?),
            keys::IN => match operand {
                Value::Array(items) => FieldOperator::In(scalar_list(items, trail)?),
                _ => {
                    return trail.reject(Violation::InvalidOperand {
                        operator: keys::IN,
                        expected: "an array of scalars",
                    })
                }
            },
            keys::CONTAINS => FieldOperator::Contains(self.contains(operand, depth, trail)?),
            keys::EXISTS => match operand {
                Value::Bool(flag) => FieldOperator::Exists(*flag),
                _ => {
                    return trail.reject(Violation::InvalidOperand {
                        operator: keys::EXISTS,
                        expected: "a boolean",
                    })
                }
            },
            unknown => return trail.reject(Violation::UnknownOperator(unknown.to_string())),
        };
        trail.pop();
        Ok(operator)
    }

    fn contains<'v>(
        &self,
        operand: &'v Value,
        depth: usize,
        trail: &mut Trail<'v>,
    ) -> Result<ContainsValue, PredicateError> {
        if let Some(scalar) = Scalar::from_value(operand) {
            return Ok(ContainsValue::Scalar(scalar));
        }
        match operand {
            Value::Object(_) => self
                .predicate(operand, depth + 1, trail)
                .map(|inner| ContainsValue::Predicate(Box::new(inner))),
            _ => trail.reject(Violation::InvalidOperand {
                operator: keys::CONTAINS,
                expected: "a scalar or an object",
            }),
        }
    }
}

fn scalar_operand(
    operator: &'static str,
    operand: &Value,
    trail: &Trail<'_>,
) -> Result<Scalar, PredicateError> {
    match Scalar::from_value(operand) {
        Some(scalar) => Ok(scalar),
        None => trail.reject(Violation::InvalidOperand {
            operator,
            expected: "a string, number or boolean",
        }),
    }
}

fn scalar_list(items: &[Value], trail: &mut Trail<'_>) -> Result<Vec<Scalar>, PredicateError> {
    let mut scalars = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match Scalar::from_value(item) {
            Some(scalar) => scalars.push(scalar),
            None => {
                trail.index(index);
                return trail.reject(Violation::NonScalarElement { index });
            }
        }
    }
    Ok(scalars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejection(input: Value) -> (String, Violation) {
        match validate(&input) {
            Err(PredicateError::Malformed { path, reason }) => (path, reason),
            other => panic!("expected a malformed predicate, got {other:?}"),
        }
    }

    fn nested_not(levels: usize) -> Value {
        let mut value = json!({"kind": "component"});
        for _ in 0..levels {
            value = json!({ "$not": value });
        }
        value
    }

    #[test]
    fn accepts_field_conditions_in_input_order() {
        let input = json!({"kind": "component", "spec.type": "service"});
        let predicate = validate(&input).unwrap();
        assert_eq!(predicate.to_value(), input);
        assert_eq!(
            serde_json::to_string(&predicate).unwrap(),
            r#"{"kind":"component","spec.type":"service"}"#
        );
    }

    #[test]
    fn classifies_operators() {
        let predicate = validate(&json!({
            "metadata.tags": {"$in": ["java", 1, true]},
            "spec.owner": {"$exists": false},
            "spec.type": {"$ne": "service"}
        }))
        .unwrap();

        let Predicate::Fields(fields) = predicate else {
            panic!("expected field conditions");
        };
        assert_eq!(
            fields.get("metadata.tags"),
            Some(&FieldValue::Operator(FieldOperator::In(vec![
                "java".into(),
                1i64.into(),
                true.into()
            ])))
        );
        assert_eq!(
            fields.get("spec.owner"),
            Some(&FieldValue::Operator(FieldOperator::Exists(false)))
        );
    }

    #[test]
    fn mixing_combinator_and_fields_is_rejected() {
        let (path, reason) = rejection(json!({"$and": [{"x": 1}], "kind": "component"}));
        assert_eq!(path, "<root>");
        assert_eq!(
            reason,
            Violation::MixedCombinator {
                combinator: "$and".into()
            }
        );
    }

    #[test]
    fn combinators_require_non_empty_arrays() {
        let (_, reason) = rejection(json!({"$or": []}));
        assert_eq!(
            reason,
            Violation::EmptyCombinator {
                combinator: "$or".into()
            }
        );

        let (_, reason) = rejection(json!({"$and": {"x": 1}}));
        assert_eq!(
            reason,
            Violation::CombinatorNotArray {
                combinator: "$and".into()
            }
        );
    }

    #[test]
    fn not_takes_a_single_predicate() {
        let (path, reason) = rejection(json!({"$not": [{"x": 1}]}));
        assert_eq!(path, "$not");
        assert_eq!(reason, Violation::NotAnObject { found: "an array" });
    }

    #[test]
    fn reports_path_of_nested_unknown_operator() {
        let (path, reason) = rejection(json!({
            "$or": [
                {"kind": "api"},
                {"$and": [{"kind": "component", "spec.type": {"$regex": "svc"}}]}
            ]
        }));
        assert_eq!(path, "$or[1].$and[0].spec.type.$regex");
        assert_eq!(reason, Violation::UnknownOperator("$regex".into()));
    }

    #[test]
    fn reports_index_of_structured_in_element() {
        let (path, reason) = rejection(json!({"kind": {"$in": ["a", {"x": 1}]}}));
        assert_eq!(path, "kind.$in[1]");
        assert_eq!(reason, Violation::NonScalarElement { index: 1 });
    }

    #[test]
    fn operator_objects_hold_exactly_one_key() {
        let (_, reason) = rejection(json!({"kind": {"$eq": "a", "$ne": "b"}}));
        assert_eq!(reason, Violation::OperatorArity { count: 2 });

        let (_, reason) = rejection(json!({"kind": {}}));
        assert_eq!(reason, Violation::OperatorArity { count: 0 });
    }

    #[test]
    fn exists_requires_a_boolean() {
        let (_, reason) = rejection(json!({"spec.owner": {"$exists": "yes"}}));
        assert_eq!(
            reason,
            Violation::InvalidOperand {
                operator: "$exists",
                expected: "a boolean"
            }
        );
    }

    #[test]
    fn eq_rejects_structured_operands() {
        let (_, reason) = rejection(json!({"kind": {"$eq": ["a"]}}));
        assert!(matches!(
            reason,
            Violation::InvalidOperand { operator: "$eq", .. }
        ));
    }

    #[test]
    fn contains_validates_substructure_recursively() {
        assert!(validate(&json!({"relations": {"$contains": {"type": "ownedBy"}}})).is_ok());

        let (path, reason) =
            rejection(json!({"relations": {"$contains": {"type": {"$bogus": 1}}}}));
        assert_eq!(path, "relations.$contains.type.$bogus");
        assert_eq!(reason, Violation::UnknownOperator("$bogus".into()));

        let (_, reason) = rejection(json!({"relations": {"$contains": null}}));
        assert!(matches!(
            reason,
            Violation::InvalidOperand {
                operator: "$contains",
                ..
            }
        ));
    }

    #[test]
    fn unknown_dollar_keys_are_not_field_paths() {
        let (_, reason) = rejection(json!({"$unknown": "foo"}));
        assert_eq!(reason, Violation::UnknownKey("$unknown".into()));
    }

    #[test]
    fn empty_field_path_is_rejected() {
        let (_, reason) = rejection(json!({"": "foo"}));
        assert_eq!(reason, Violation::EmptyFieldPath);
    }

    #[test]
    fn empty_object_is_an_empty_field_condition() {
        let predicate = validate(&json!({})).unwrap();
        assert_eq!(predicate, Predicate::Fields(FieldConditions::new()));
    }

    #[test]
    fn depth_bound_is_inclusive() {
        let validator = Validator::with_max_depth(4);
        let accepted = validator.validate(&nested_not(3)).unwrap();
        assert_eq!(accepted.depth(), 4);

        let err = validator.validate(&nested_not(4)).unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&Violation::DepthExceeded { max: 4 })
        );
    }

    #[test]
    fn contains_substructures_count_towards_depth() {
        let validator = Validator::with_max_depth(2);
        let input = json!({"$and": [{"relations": {"$contains": {"type": "ownedBy"}}}]});
        assert!(validator.validate(&input).is_err());
        assert!(Validator::with_max_depth(3).validate(&input).is_ok());
    }

    #[test]
    fn default_depth_handles_deep_but_bounded_input() {
        assert!(validate(&nested_not(DEFAULT_MAX_DEPTH - 1)).is_ok());
        assert!(validate(&nested_not(DEFAULT_MAX_DEPTH)).is_err());
    }

    #[test]
    fn syntax_errors_are_not_malformed_predicates() {
        let err = validate_str("{\"kind\": ").unwrap_err();
        assert!(matches!(err, PredicateError::Syntax(_)));
        assert!(!err.is_malformed());
    }

    #[test]
    fn validating_deserialize_rejects_bad_input() {
        let err = serde_json::from_str::<Predicate>(r#"{"kind": {"$unknown": "foo"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown operator"));

        let predicate: Predicate = serde_json::from_str(r#"{"kind": "group"}"#).unwrap();
        assert_eq!(predicate.to_value(), json!({"kind": "group"}));
    }

    #[test]
    fn options_follow_configuration() {
        let config = PredicateConfig {
            max_depth: 7,
            ..PredicateConfig::default()
        };
        let validator = Validator::new(ValidatorOptions::from(&config));
        assert_eq!(validator.options().max_depth, 7);
    }

    #[test]
    fn zero_depth_still_admits_a_flat_predicate() {
        let validator = Validator::with_max_depth(0);
        assert_eq!(validator.options().max_depth, 1);
        assert!(validator.validate(&json!({"kind": "component"})).is_ok());

        let err = validator.validate(&json!({"$not": {"kind": "group"}})).unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::DepthExceeded { max: 1 }));
    }
}
