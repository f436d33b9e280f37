use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::field_path::FieldPath;

/// Reserved keys recognised by the grammar.
pub mod keys {
    pub const AND: &str = "$and";
    pub const OR: &str = "$or";
    pub const NOT: &str = "$not";
    pub const EQ: &str = "$eq";
    pub const NE: &str = "$ne";
    pub const IN: &str = "$in";
    pub const CONTAINS: &str = "$contains";
    pub const EXISTS: &str = "$exists";

    pub const COMBINATORS: [&str; 3] = [AND, OR, NOT];
    pub const OPERATORS: [&str; 5] = [EQ, NE, IN, CONTAINS, EXISTS];
}

/// Validated node of an entity selection query.
///
/// Values only come out of the validator (or a validating `Deserialize`),
/// and serialize back to exactly the JSON they were read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Every nested predicate must match.
    And(Vec<Predicate>),
    /// At least one nested predicate must match.
    Or(Vec<Predicate>),
    /// The nested predicate must not match.
    Not(Box<Predicate>),
    /// Field conditions, implicitly combined with AND.
    Fields(FieldConditions),
}

/// Ordered field-path entries of a field-condition node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldConditions(Vec<(FieldPath, FieldValue)>);

/// Constraint placed on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Shorthand equality against a scalar.
    Literal(Scalar),
    /// Shorthand equality against a whole list of scalars.
    LiteralArray(Vec<Scalar>),
    Operator(FieldOperator),
}

/// Single-key operator object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperator {
    Eq(Scalar),
    Ne(Scalar),
    In(Vec<Scalar>),
    Contains(ContainsValue),
    Exists(bool),
}

/// Operand of `$contains`: a plain element, or a substructure to look for.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainsValue {
    Scalar(Scalar),
    Predicate(Box<Predicate>),
}

/// Plain JSON value that is not null, an array or an object.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
}

impl Scalar {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Scalar::String(text.clone())),
            Value::Number(number) => Some(Scalar::Number(number.clone())),
            Value::Bool(flag) => Some(Scalar::Bool(*flag)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scalar::String(text) => Value::String(text.clone()),
            Scalar::Number(number) => Value::Number(number.clone()),
            Scalar::Bool(flag) => Value::Bool(*flag),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl FieldConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: FieldPath, value: FieldValue) {
        self.0.push((path, value));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldValue)> {
        self.0.iter().map(|(path, value)| (path, value))
    }

    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate.as_str() == path)
            .map(|(_, value)| value)
    }
}

impl FromIterator<(FieldPath, FieldValue)> for FieldConditions {
    fn from_iter<T: IntoIterator<Item = (FieldPath, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Predicate {
    /// Nesting depth; a lone field-condition node has depth 1.
    ///
    /// Uses the same counting as the validator's depth bound, so a predicate
    /// accepted with `max_depth = n` always reports `depth() <= n`.
    pub fn depth(&self) -> usize {
        match self {
            Predicate::And(items) | Predicate::Or(items) => {
                1 + items.iter().map(Predicate::depth).max().unwrap_or(0)
            }
            Predicate::Not(inner) => 1 + inner.depth(),
            Predicate::Fields(fields) => {
                1 + fields
                    .iter()
                    .filter_map(|(_, value)| match value {
                        FieldValue::Operator(FieldOperator::Contains(
                            ContainsValue::Predicate(inner),
                        )) => Some(inner.depth()),
                        _ => None,
                    })
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Field paths addressed on the entity itself, in document order.
    ///
    /// Paths inside a `$contains` substructure are relative to the contained
    /// element and are not included.
    pub fn field_paths(&self) -> Vec<&FieldPath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a FieldPath>) {
        match self {
            Predicate::And(items) | Predicate::Or(items) => {
                for item in items {
                    item.collect_paths(paths);
                }
            }
            Predicate::Not(inner) => inner.collect_paths(paths),
            Predicate::Fields(fields) => paths.extend(fields.iter().map(|(path, _)| path)),
        }
    }

    /// Rebuilds the JSON value this predicate was validated from.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self {
            Predicate::And(items) => {
                map.insert(keys::AND.to_string(), list_value(items));
            }
            Predicate::Or(items) => {
                map.insert(keys::OR.to_string(), list_value(items));
            }
            Predicate::Not(inner) => {
                map.insert(keys::NOT.to_string(), inner.to_value());
            }
            Predicate::Fields(fields) => {
                for (path, value) in fields.iter() {
                    map.insert(path.as_str().to_string(), value.to_value());
                }
            }
        }
        Value::Object(map)
    }
}

fn list_value(items: &[Predicate]) -> Value {
    Value::Array(items.iter().map(Predicate::to_value).collect())
}

fn scalars_value(items: &[Scalar]) -> Value {
    Value::Array(items.iter().map(Scalar::to_value).collect())
}

impl FieldValue {
    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Literal(scalar) => scalar.to_value(),
            FieldValue::LiteralArray(items) => scalars_value(items),
            FieldValue::Operator(operator) => operator.to_value(),
        }
    }
}

impl FieldOperator {
    /// The operator key as it appears in JSON.
    pub fn key(&self) -> &'static str {
        match self {
            FieldOperator::Eq(_) => keys::EQ,
            FieldOperator::Ne(_) => keys::NE,
            FieldOperator::In(_) => keys::IN,
            FieldOperator::Contains(_) => keys::CONTAINS,
            FieldOperator::Exists(_) => keys::EXISTS,
        }
    }

    pub fn to_value(&self) -> Value {
        let operand = match self {
            FieldOperator::Eq(scalar) | FieldOperator::Ne(scalar) => scalar.to_value(),
            FieldOperator::In(items) => scalars_value(items),
            FieldOperator::Contains(ContainsValue::Scalar(scalar)) => scalar.to_value(),
            FieldOperator::Contains(ContainsValue::Predicate(inner)) => inner.to_value(),
            FieldOperator::Exists(flag) => Value::Bool(*flag),
        };
        let mut map = Map::new();
        map.insert(self.key().to_string(), operand);
        Value::Object(map)
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        crate::validator::validate(&value).map_err(D::Error::custom)
    }
}

impl From<&Predicate> for Value {
    fn from(value: &Predicate) -> Self {
        value.to_value()
    }
}

impl From<Predicate> for Value {
    fn from(value: Predicate) -> Self {
        value.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).expect("valid path")
    }

    fn fields(entries: Vec<(&str, FieldValue)>) -> Predicate {
        Predicate::Fields(
            entries
                .into_iter()
                .map(|(raw, value)| (path(raw), value))
                .collect(),
        )
    }

    #[test]
    fn rebuilds_json_in_input_key_order() {
        let predicate = fields(vec![
            ("spec.type", FieldValue::Literal("service".into())),
            ("kind", FieldValue::Literal("component".into())),
        ]);

        let rendered = serde_json::to_string(&predicate).unwrap();
        assert_eq!(rendered, r#"{"spec.type":"service","kind":"component"}"#);
    }

    #[test]
    fn renders_operators_and_combinators() {
        let predicate = Predicate::Not(Box::new(Predicate::Or(vec![
            fields(vec![(
                "metadata.tags",
                FieldValue::Operator(FieldOperator::In(vec!["java".into(), 2i64.into()])),
            )]),
            fields(vec![(
                "spec.owner",
                FieldValue::Operator(FieldOperator::Exists(false)),
            )]),
        ])));

        assert_eq!(
            predicate.to_value(),
            json!({"$not": {"$or": [
                {"metadata.tags": {"$in": ["java", 2]}},
                {"spec.owner": {"$exists": false}}
            ]}})
        );
    }

    #[test]
    fn measures_depth_through_contains() {
        let relation = fields(vec![("type", FieldValue::Literal("ownedBy".into()))]);
        let predicate = Predicate::And(vec![fields(vec![(
            "relations",
            FieldValue::Operator(FieldOperator::Contains(ContainsValue::Predicate(
                Box::new(relation),
            ))),
        )])]);

        assert_eq!(predicate.depth(), 3);
    }

    #[test]
    fn lists_entity_field_paths_in_order() {
        let predicate = Predicate::Or(vec![
            fields(vec![
                ("kind", FieldValue::Literal("component".into())),
                ("spec.type", FieldValue::Literal("service".into())),
            ]),
            Predicate::Not(Box::new(fields(vec![(
                "relations",
                FieldValue::Operator(FieldOperator::Contains(ContainsValue::Predicate(
                    Box::new(fields(vec![("type", FieldValue::Literal("ownedBy".into()))])),
                ))),
            )]))),
        ]);

        let paths: Vec<&str> = predicate
            .field_paths()
            .into_iter()
            .map(FieldPath::as_str)
            .collect();
        assert_eq!(paths, vec!["kind", "spec.type", "relations"]);
    }

    #[test]
    fn looks_up_conditions_by_path() {
        let predicate = fields(vec![("kind", FieldValue::Literal("group".into()))]);
        let Predicate::Fields(conditions) = predicate else {
            panic!("expected field conditions");
        };
        assert_eq!(
            conditions.get("kind"),
            Some(&FieldValue::Literal(Scalar::String("group".into())))
        );
        assert!(conditions.get("spec.type").is_none());
    }
}
