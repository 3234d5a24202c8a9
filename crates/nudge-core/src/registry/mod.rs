//! Static registries of variables and operators.
//!
//! Both registries are leaves: every other module resolves field types and
//! operator capabilities through them.

mod operators;
mod variables;

pub use operators::{
    lookup_operator, operators_valid_for, OperatorDefinition, OperatorKey, ValueArity, OPERATORS,
};
pub use variables::{
    lookup_variable, variables, DataType, VariableCategory, VariableDefinition, VariableKey,
    BACKGROUND_VARIABLES, USER_PLANS, VARIABLES,
};
