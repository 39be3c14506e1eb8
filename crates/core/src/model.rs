use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::SchemaError;

pub const SUBSTATS: &str = "Substats";

/// The decoded root of an `.hsf` file.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDocument {
    root: Value,
}

impl RuleDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Top-level keys in document order. Empty when the root is not an object.
    pub fn top_level_keys(&self) -> Vec<String> {
        match &self.root {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn rules(&self) -> Result<Vec<Rule<'_>>, SchemaError> {
        let Value::Object(top) = &self.root else {
            return Err(SchemaError::DocumentNotObject);
        };
        let Some(rules) = top.get("Rules") else {
            return Err(SchemaError::MissingRules);
        };
        let Value::Array(items) = rules else {
            return Err(SchemaError::RulesNotArray);
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(fields) => Ok(Rule { index, fields }),
                _ => Err(SchemaError::RuleNotObject { rule: index }),
            })
            .collect()
    }
}

/// Borrowed view of one entry of `Rules`.
#[derive(Debug, Clone, Copy)]
pub struct Rule<'a> {
    pub index: usize,
    fields: &'a Map<String, Value>,
}

impl<'a> Rule<'a> {
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn require(&self, field: &str) -> Result<&'a Value, SchemaError> {
        self.get(field).ok_or_else(|| SchemaError::MissingRuleField {
            field: field.to_string(),
            rule: self.index,
        })
    }

    /// The rule's `Substats`; an absent field means no substats.
    pub fn substats(&self) -> Result<Vec<Substat<'a>>, SchemaError> {
        let items = match self.get(SUBSTATS) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(SchemaError::SubstatsNotArray { rule: self.index }),
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(fields) => Ok(Substat {
                    rule: self.index,
                    index,
                    fields,
                }),
                _ => Err(SchemaError::SubstatNotObject {
                    rule: self.index,
                    substat: index,
                }),
            })
            .collect()
    }

    /// Substats that are well-formed objects, skipping anything else.
    pub fn substats_lenient(&self) -> impl Iterator<Item = &'a Map<String, Value>> {
        let items: &'a [Value] = match self.get(SUBSTATS) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };
        items.iter().filter_map(Value::as_object)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Substat<'a> {
    pub rule: usize,
    pub index: usize,
    fields: &'a Map<String, Value>,
}

impl<'a> Substat<'a> {
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn require(&self, field: &str) -> Result<&'a Value, SchemaError> {
        self.get(field).ok_or_else(|| SchemaError::MissingSubstatField {
            field: field.to_string(),
            rule: self.rule,
            substat: self.index,
        })
    }
}

/// Structural type of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Shape::Null,
            Value::Bool(_) => Shape::Bool,
            Value::Number(_) => Shape::Number,
            Value::String(_) => Shape::String,
            Value::Array(_) => Shape::Array,
            Value::Object(_) => Shape::Object,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Bool => "bool",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::Array => "array",
            Shape::Object => "object",
        }
    }

    pub fn is_scalar(self) -> bool {
        !matches!(self, Shape::Array | Shape::Object)
    }
}

/// A JSON value with a total order, used for every distinct-value set.
///
/// Ordering is null < bool < number < string < composite. Numbers compare
/// numerically, strings by byte order, and arrays/objects by their compact
/// JSON text.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Composite(Value),
}

impl ScalarValue {
    fn rank(&self) -> u8 {
        match self {
            ScalarValue::Null => 0,
            ScalarValue::Bool(_) => 1,
            ScalarValue::Number(_) => 2,
            ScalarValue::String(_) => 3,
            ScalarValue::Composite(_) => 4,
        }
    }
}

impl From<&Value> for ScalarValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => ScalarValue::Null,
            Value::Bool(b) => ScalarValue::Bool(*b),
            Value::Number(n) => ScalarValue::Number(n.clone()),
            Value::String(s) => ScalarValue::String(s.clone()),
            other => ScalarValue::Composite(other.clone()),
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Number(n) => write!(f, "{n}"),
            ScalarValue::String(s) => write!(f, "{s:?}"),
            ScalarValue::Composite(v) => write!(f, "{v}"),
        }
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    x.total_cmp(&y)
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

impl Ord for ScalarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use ScalarValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Number(a), Number(b)) => compare_numbers(a, b),
            (String(a), String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Composite(a), Composite(b)) => a.to_string().cmp(&b.to_string()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarValue {}
