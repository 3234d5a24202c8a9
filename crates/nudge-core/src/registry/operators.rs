//! Catalogue of comparison operators usable in a condition leaf.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use super::variables::DataType;

/// Operator identifier. Declaration order is the canonical order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperatorKey {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Between,
    IsTrue,
    IsFalse,
}

/// How many operands an operator takes besides the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueArity {
    /// No value and no reference.
    None,
    /// A single literal, or a reference when allowed.
    Single,
    /// An inclusive `[lower, upper]` pair.
    Range,
}

/// Static description of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDefinition {
    pub key: OperatorKey,
    pub label: &'static str,
    pub symbol: &'static str,
    pub valid_for: &'static [DataType],
    pub arity: ValueArity,
    /// Whether the operand may be another variable instead of a literal.
    pub allows_ref: bool,
}

impl OperatorDefinition {
    /// Whether this operator accepts operands of the given type.
    pub fn accepts(&self, data_type: DataType) -> bool {
        self.valid_for.contains(&data_type)
    }
}

const ALL_TYPES: &[DataType] = &[DataType::Number, DataType::Boolean, DataType::String];
const NUMERIC: &[DataType] = &[DataType::Number];
const BOOLEAN: &[DataType] = &[DataType::Boolean];

/// The operator catalogue, indexed by `OperatorKey as usize`.
pub static OPERATORS: [OperatorDefinition; 9] = [
    OperatorDefinition { key: OperatorKey::Eq, label: "Equals", symbol: "=", valid_for: ALL_TYPES, arity: ValueArity::Single, allows_ref: true },
    OperatorDefinition { key: OperatorKey::Neq, label: "Not equal", symbol: "!=", valid_for: ALL_TYPES, arity: ValueArity::Single, allows_ref: true },
    OperatorDefinition { key: OperatorKey::Lt, label: "Less than", symbol: "<", valid_for: NUMERIC, arity: ValueArity::Single, allows_ref: true },
    OperatorDefinition { key: OperatorKey::Lte, label: "Less than or equal", symbol: "<=", valid_for: NUMERIC, arity: ValueArity::Single, allows_ref: true },
    OperatorDefinition { key: OperatorKey::Gt, label: "Greater than", symbol: ">", valid_for: NUMERIC, arity: ValueArity::Single, allows_ref: true },
    OperatorDefinition { key: OperatorKey::Gte, label: "Greater than or equal", symbol: ">=", valid_for: NUMERIC, arity: ValueArity::Single, allows_ref: true },
    OperatorDefinition { key: OperatorKey::Between, label: "Between", symbol: "between", valid_for: NUMERIC, arity: ValueArity::Range, allows_ref: false },
    OperatorDefinition { key: OperatorKey::IsTrue, label: "Is true", symbol: "is true", valid_for: BOOLEAN, arity: ValueArity::None, allows_ref: false },
    OperatorDefinition { key: OperatorKey::IsFalse, label: "Is false", symbol: "is false", valid_for: BOOLEAN, arity: ValueArity::None, allows_ref: false },
];

impl OperatorKey {
    /// Static definition of this operator.
    pub fn definition(self) -> &'static OperatorDefinition {
        &OPERATORS[self as usize]
    }

    pub fn arity(self) -> ValueArity {
        self.definition().arity
    }

    pub fn allows_ref(self) -> bool {
        self.definition().allows_ref
    }

    /// Whether this operator may be paired with a variable of the given type.
    pub fn is_valid_for(self, data_type: DataType) -> bool {
        self.definition().accepts(data_type)
    }
}

/// Look up an operator by its wire key.
pub fn lookup_operator(key: &str) -> Option<&'static OperatorDefinition> {
    key.parse::<OperatorKey>().ok().map(OperatorKey::definition)
}

/// Operators accepting the given data type, in canonical order.
pub fn operators_valid_for(data_type: DataType) -> Vec<OperatorKey> {
    OperatorKey::iter()
        .filter(|op| op.is_valid_for(data_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_matches_key_order() {
        for (idx, key) in OperatorKey::iter().enumerate() {
            assert_eq!(OPERATORS[idx].key, key);
        }
    }

    #[test]
    fn test_operators_valid_for_number() {
        assert_eq!(
            operators_valid_for(DataType::Number),
            vec![
                OperatorKey::Eq,
                OperatorKey::Neq,
                OperatorKey::Lt,
                OperatorKey::Lte,
                OperatorKey::Gt,
                OperatorKey::Gte,
                OperatorKey::Between,
            ]
        );
    }

    #[test]
    fn test_operators_valid_for_boolean_and_string() {
        assert_eq!(
            operators_valid_for(DataType::Boolean),
            vec![
                OperatorKey::Eq,
                OperatorKey::Neq,
                OperatorKey::IsTrue,
                OperatorKey::IsFalse,
            ]
        );
        assert_eq!(
            operators_valid_for(DataType::String),
            vec![OperatorKey::Eq, OperatorKey::Neq]
        );
    }

    #[test]
    fn test_lookup_operator() {
        let between = lookup_operator("between").unwrap();
        assert_eq!(between.arity, ValueArity::Range);
        assert!(!between.allows_ref);
        assert!(lookup_operator("contains").is_none());
        assert_eq!(OperatorKey::IsTrue.to_string(), "is_true");
    }
}
