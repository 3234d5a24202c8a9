//! Condition tree types and their wire representation.
//!
//! On the wire a node is the bare JSON object: a group carries `operator`
//! and `rules`, a leaf carries `field`, `op`, and optionally `value` or
//! `ref`. In Rust the distinction is an explicit enum.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::fmt;

use crate::registry::{DataType, OperatorKey, VariableKey};

/// A literal operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Literal {
    /// Integer literal.
    pub fn int(value: i64) -> Self {
        Self::Number(Number::from(value))
    }

    /// Floating point literal. `None` for NaN and infinities.
    pub fn float(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Number)
    }

    /// Data type this literal inhabits.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Boolean,
            Self::Number(_) => DataType::Number,
            Self::Text(_) => DataType::String,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::int(i64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Operand of a leaf: a scalar literal or an inclusive numeric range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// `[lower, upper]`. Bounds are kept in the order the author entered them.
    Range([Number; 2]),
    Scalar(Literal),
}

impl ConditionValue {
    /// Range used when an operator switches to range arity.
    pub fn default_range() -> Self {
        Self::Range([Number::from(0), Number::from(1)])
    }

    pub fn range(lower: i64, upper: i64) -> Self {
        Self::Range([Number::from(lower), Number::from(upper)])
    }

    pub fn as_scalar(&self) -> Option<&Literal> {
        match self {
            Self::Scalar(lit) => Some(lit),
            Self::Range(_) => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range(_))
    }
}

impl From<Literal> for ConditionValue {
    fn from(value: Literal) -> Self {
        Self::Scalar(value)
    }
}

/// Leaf predicate comparing one variable against a literal, a range, or
/// another variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub field: VariableKey,
    pub op: OperatorKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConditionValue>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_field: Option<VariableKey>,
}

impl ConditionRule {
    /// Leaf comparing `field` against a literal.
    pub fn literal(field: VariableKey, op: OperatorKey, value: impl Into<Literal>) -> Self {
        Self {
            field,
            op,
            value: Some(ConditionValue::Scalar(value.into())),
            ref_field: None,
        }
    }

    /// Leaf comparing `field` against another variable.
    pub fn reference(field: VariableKey, op: OperatorKey, other: VariableKey) -> Self {
        Self {
            field,
            op,
            value: None,
            ref_field: Some(other),
        }
    }

    /// `field between [lower, upper]`.
    pub fn between(field: VariableKey, lower: i64, upper: i64) -> Self {
        Self {
            field,
            op: OperatorKey::Between,
            value: Some(ConditionValue::range(lower, upper)),
            ref_field: None,
        }
    }

    /// Leaf for an operator that takes no operand (`is_true`, `is_false`).
    pub fn unary(field: VariableKey, op: OperatorKey) -> Self {
        Self {
            field,
            op,
            value: None,
            ref_field: None,
        }
    }
}

/// Boolean connector of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn flipped(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Internal node: an ordered list of children joined by one connector.
///
/// Child order matters for display only; AND and OR are commutative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(default)]
    pub operator: Connector,
    #[serde(default)]
    pub rules: Vec<ConditionNode>,
}

/// A child of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Rule(ConditionRule),
    Group(ConditionGroup),
}

impl ConditionNode {
    pub fn as_rule(&self) -> Option<&ConditionRule> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Rule(_) => None,
        }
    }
}

impl From<ConditionRule> for ConditionNode {
    fn from(rule: ConditionRule) -> Self {
        Self::Rule(rule)
    }
}

impl From<ConditionGroup> for ConditionNode {
    fn from(group: ConditionGroup) -> Self {
        Self::Group(group)
    }
}

impl Serialize for ConditionNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Rule(rule) => rule.serialize(serializer),
            Self::Group(group) => group.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ConditionNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(D::Error::custom("condition node must be a JSON object"));
        }

        let is_group = match value.get("kind").and_then(|k| k.as_str()) {
            Some("group") => true,
            Some("rule") => false,
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "unknown condition node kind '{}'",
                    other
                )))
            }
            None if value.get("rules").is_some() => true,
            None if value.get("field").is_some() => false,
            None => {
                return Err(D::Error::custom(
                    "condition node must contain either `rules` (group) or `field` (rule)",
                ))
            }
        };

        if is_group {
            serde_json::from_value(value)
                .map(Self::Group)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Self::Rule)
                .map_err(D::Error::custom)
        }
    }
}
