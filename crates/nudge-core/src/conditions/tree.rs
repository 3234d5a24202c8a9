//! Editing and query operations on the condition tree.
//!
//! Leaf edits consume the leaf and return the normalized replacement, so a
//! leaf never exists in a half-updated state. Group edits mutate in place
//! and touch only the targeted group.

use std::collections::BTreeSet;

use tracing::debug;

use super::types::{ConditionGroup, ConditionNode, ConditionRule, ConditionValue, Connector, Literal};
use crate::error::{NudgeError, NudgeResult};
use crate::registry::{operators_valid_for, OperatorKey, ValueArity, VariableKey};

impl ConditionRule {
    /// The leaf added by "add condition": `steps gt 0`.
    pub fn create_default() -> Self {
        Self::literal(VariableKey::Steps, OperatorKey::Gt, 0)
    }

    /// Change the variable and re-derive operator and operands.
    ///
    /// The operator survives if it accepts the new field's type, otherwise
    /// the first valid operator is selected. The operand is always reset to
    /// the new type's default and any reference is dropped.
    pub fn replace_field(self, field: VariableKey) -> Self {
        if field == self.field {
            return self;
        }

        let valid = operators_valid_for(field.data_type());
        let op = if valid.contains(&self.op) {
            self.op
        } else {
            // eq accepts every data type
            valid.first().copied().unwrap_or(OperatorKey::Eq)
        };
        debug!(from = %self.field, to = %field, op = %op, "Replacing condition field");

        Self {
            field,
            op,
            value: Some(ConditionValue::Scalar(field.default_literal())),
            ref_field: None,
        }
        .rederive_operands()
    }

    /// Change the operator and re-derive the operands for its arity.
    ///
    /// An operator that does not accept the field's type is ignored.
    pub fn replace_operator(mut self, op: OperatorKey) -> Self {
        if !op.is_valid_for(self.field.data_type()) {
            debug!(field = %self.field, op = %op, "Ignoring operator not valid for field type");
            return self;
        }
        if op != self.op {
            debug!(field = %self.field, from = %self.op, to = %op, "Replacing condition operator");
        }
        self.op = op;
        self.rederive_operands()
    }

    /// Switch between literal and reference mode.
    ///
    /// Entering reference mode points at the first other variable of the
    /// same data type. Operators without reference mode are left untouched,
    /// as are fields that have no same-typed peer.
    pub fn toggle_reference_mode(mut self) -> Self {
        if !self.op.allows_ref() {
            return self;
        }

        if self.ref_field.is_some() {
            self.ref_field = None;
            self.value = Some(ConditionValue::Scalar(self.field.default_literal()));
            return self;
        }

        let data_type = self.field.data_type();
        if let Some(peer) = VariableKey::all().find(|k| *k != self.field && k.data_type() == data_type) {
            self.ref_field = Some(peer);
            self.value = None;
        }
        self
    }

    /// Set a literal operand, leaving reference mode.
    ///
    /// A literal the operator cannot take (any literal for `is_true`, a
    /// scalar for `between`, a wrongly typed scalar) is replaced by the
    /// operator's default operand.
    pub fn set_value(mut self, value: impl Into<ConditionValue>) -> Self {
        self.value = Some(value.into());
        self.ref_field = None;
        self.rederive_operands()
    }

    /// Bring an arbitrary leaf into a consistent state: operator valid for
    /// the field, operands matching the operator's arity.
    pub fn normalize(self) -> Self {
        let valid = operators_valid_for(self.field.data_type());
        if valid.contains(&self.op) {
            self.rederive_operands()
        } else {
            let op = valid.first().copied().unwrap_or(OperatorKey::Eq);
            Self {
                op,
                value: None,
                ref_field: None,
                ..self
            }
            .rederive_operands()
        }
    }

    /// Operand cascade for the current operator. Applying it twice is the
    /// same as applying it once.
    fn rederive_operands(mut self) -> Self {
        let def = self.op.definition();

        if def.arity == ValueArity::None {
            self.value = None;
            self.ref_field = None;
            return self;
        }

        if !def.allows_ref && self.ref_field.take().is_some() {
            self.value = Some(ConditionValue::Scalar(self.field.default_literal()));
        }

        match def.arity {
            ValueArity::Range => {
                if !matches!(self.value, Some(ConditionValue::Range(_))) {
                    self.value = Some(ConditionValue::default_range());
                }
            }
            ValueArity::Single => {
                if self.ref_field.is_some() {
                    // reference wins over a stale literal
                    self.value = None;
                } else {
                    let field_type = self.field.data_type();
                    let keep = matches!(
                        &self.value,
                        Some(ConditionValue::Scalar(lit)) if lit.data_type() == field_type
                    );
                    if !keep {
                        self.value = Some(ConditionValue::Scalar(self.field.default_literal()));
                    }
                }
            }
            ValueArity::None => {}
        }
        self
    }
}

impl ConditionGroup {
    pub fn new(operator: Connector) -> Self {
        Self {
            operator,
            rules: Vec::new(),
        }
    }

    /// AND group over the given children.
    pub fn all(rules: Vec<ConditionNode>) -> Self {
        Self {
            operator: Connector::And,
            rules,
        }
    }

    /// OR group over the given children.
    pub fn any(rules: Vec<ConditionNode>) -> Self {
        Self {
            operator: Connector::Or,
            rules,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Insert a child at `index`, or append when `index` is `None` or past
    /// the end. Returns the position the child landed at.
    pub fn insert_child(&mut self, child: impl Into<ConditionNode>, index: Option<usize>) -> usize {
        let at = index.map_or(self.rules.len(), |i| i.min(self.rules.len()));
        self.rules.insert(at, child.into());
        at
    }

    /// Remove and return the child at `index`.
    pub fn remove_child(&mut self, index: usize) -> NudgeResult<ConditionNode> {
        if index >= self.rules.len() {
            return Err(NudgeError::index_out_of_bounds(index, self.rules.len()));
        }
        Ok(self.rules.remove(index))
    }

    /// Move the child at `from` so that it ends up at position `to`.
    pub fn reorder_child(&mut self, from: usize, to: usize) -> NudgeResult<()> {
        let len = self.rules.len();
        if from >= len {
            return Err(NudgeError::index_out_of_bounds(from, len));
        }
        if to >= len {
            return Err(NudgeError::index_out_of_bounds(to, len));
        }
        if from != to {
            let node = self.rules.remove(from);
            self.rules.insert(to, node);
        }
        Ok(())
    }

    /// Flip AND and OR. Children are untouched.
    pub fn toggle_connector(&mut self) {
        self.operator = self.operator.flipped();
    }

    /// Append the default leaf.
    pub fn add_default_rule(&mut self) {
        self.rules.push(ConditionRule::create_default().into());
    }

    /// Append a subgroup seeded with `current_hour gte 18`.
    pub fn add_default_group(&mut self) {
        let seed = ConditionRule::literal(VariableKey::CurrentHour, OperatorKey::Gte, 18);
        self.rules
            .push(ConditionGroup::all(vec![seed.into()]).into());
    }

    /// Node reached by following child indices from this group.
    pub fn node_at(&self, path: &[usize]) -> Option<&ConditionNode> {
        let (last, parents) = path.split_last()?;
        let mut group = self;
        for idx in parents {
            group = group.rules.get(*idx)?.as_group()?;
        }
        group.rules.get(*last)
    }

    /// Mutable group reached by following child indices. An empty path is
    /// this group.
    pub fn group_at_mut(&mut self, path: &[usize]) -> Option<&mut ConditionGroup> {
        let mut group = self;
        for idx in path {
            group = match group.rules.get_mut(*idx)? {
                ConditionNode::Group(child) => child,
                ConditionNode::Rule(_) => return None,
            };
        }
        Some(group)
    }

    /// Replace the leaf at `path` with `edit(leaf)`.
    pub fn update_rule_at(
        &mut self,
        path: &[usize],
        edit: impl FnOnce(ConditionRule) -> ConditionRule,
    ) -> NudgeResult<()> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| NudgeError::validation("Path to a condition must not be empty"))?;
        let group = self
            .group_at_mut(parents)
            .ok_or_else(|| NudgeError::validation(format!("No condition group at {:?}", parents)))?;
        let len = group.rules.len();
        match group.rules.get_mut(*last) {
            Some(ConditionNode::Rule(rule)) => {
                *rule = edit(rule.clone());
                Ok(())
            }
            Some(ConditionNode::Group(_)) => Err(NudgeError::validation(format!(
                "Node at {:?} is a group, not a condition",
                path
            ))),
            None => Err(NudgeError::index_out_of_bounds(*last, len)),
        }
    }

    /// Every leaf in pre-order.
    pub fn flatten(&self) -> Vec<&ConditionRule> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ConditionRule>) {
        for node in &self.rules {
            match node {
                ConditionNode::Rule(rule) => out.push(rule),
                ConditionNode::Group(group) => group.collect_leaves(out),
            }
        }
    }

    /// Every variable read by the tree, as a field or as a reference.
    pub fn collect_referenced_fields(&self) -> BTreeSet<VariableKey> {
        self.flatten()
            .into_iter()
            .flat_map(|rule| std::iter::once(rule.field).chain(rule.ref_field))
            .collect()
    }

    /// Normalize every leaf in the tree.
    pub fn normalize_all(&mut self) {
        for node in &mut self.rules {
            match node {
                ConditionNode::Rule(rule) => *rule = rule.clone().normalize(),
                ConditionNode::Group(group) => group.normalize_all(),
            }
        }
    }

    /// Nesting depth; a group with only leaves has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .rules
            .iter()
            .filter_map(ConditionNode::as_group)
            .map(ConditionGroup::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Literal for a literal operand, if any.
pub(crate) fn scalar_of(rule: &ConditionRule) -> Option<&Literal> {
    rule.value.as_ref().and_then(ConditionValue::as_scalar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DataType;

    fn leaf(field: VariableKey, op: OperatorKey, value: i64) -> ConditionRule {
        ConditionRule::literal(field, op, value)
    }

    #[test]
    fn test_create_default() {
        let rule = ConditionRule::create_default();
        assert_eq!(rule.field, VariableKey::Steps);
        assert_eq!(rule.op, OperatorKey::Gt);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::int(0))));
        assert!(operators_valid_for(DataType::Number).contains(&rule.op));
    }

    #[test]
    fn test_replace_field_keeps_eq_across_types() {
        let rule = ConditionRule::literal(VariableKey::UserPlan, OperatorKey::Eq, "free");
        let rule = rule.replace_field(VariableKey::IsWeekend);
        assert_eq!(rule.op, OperatorKey::Eq);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::Bool(true))));
        assert_eq!(rule.ref_field, None);
    }

    #[test]
    fn test_replace_field_switches_invalid_operator() {
        let rule = leaf(VariableKey::Steps, OperatorKey::Gte, 5000);
        let rule = rule.replace_field(VariableKey::UserPlan);
        assert_eq!(rule.op, OperatorKey::Eq);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::from("free"))));
    }

    #[test]
    fn test_replace_field_between_to_boolean() {
        let rule = ConditionRule::between(VariableKey::SleepHours, 6, 9);
        let rule = rule.replace_field(VariableKey::BreakfastLogged);
        assert_eq!(rule.op, OperatorKey::Eq);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::Bool(true))));
    }

    #[test]
    fn test_replace_field_drops_reference() {
        let rule = ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal);
        let rule = rule.replace_field(VariableKey::WaterGlasses);
        assert_eq!(rule.op, OperatorKey::Lt);
        assert_eq!(rule.ref_field, None);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::int(0))));
    }

    #[test]
    fn test_replace_field_is_idempotent() {
        let rule = leaf(VariableKey::Steps, OperatorKey::Between, 0);
        let once = rule.clone().replace_field(VariableKey::IsWeekend);
        let twice = once.clone().replace_field(VariableKey::IsWeekend);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_replace_operator_arity_none_clears_operands() {
        let rule = ConditionRule::literal(VariableKey::IsWeekend, OperatorKey::Eq, true);
        let rule = rule.replace_operator(OperatorKey::IsTrue);
        assert_eq!(rule.value, None);
        assert_eq!(rule.ref_field, None);
    }

    #[test]
    fn test_replace_operator_to_range() {
        let rule = leaf(VariableKey::SleepHours, OperatorKey::Gte, 7);
        let rule = rule.replace_operator(OperatorKey::Between);
        assert_eq!(rule.value, Some(ConditionValue::range(0, 1)));
    }

    #[test]
    fn test_replace_operator_keeps_existing_range() {
        let rule = ConditionRule::between(VariableKey::SleepHours, 6, 9);
        let rule = rule.replace_operator(OperatorKey::Between);
        assert_eq!(rule.value, Some(ConditionValue::range(6, 9)));
    }

    #[test]
    fn test_replace_operator_from_range_to_single() {
        let rule = ConditionRule::between(VariableKey::SleepHours, 6, 9);
        let rule = rule.replace_operator(OperatorKey::Lt);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::int(0))));
    }

    #[test]
    fn test_replace_operator_without_ref_mode_clears_ref() {
        let rule = ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal);
        let rule = rule.replace_operator(OperatorKey::Between);
        assert_eq!(rule.ref_field, None);
        assert_eq!(rule.value, Some(ConditionValue::range(0, 1)));
    }

    #[test]
    fn test_replace_operator_keeps_ref_when_allowed() {
        let rule = ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal);
        let rule = rule.replace_operator(OperatorKey::Gte);
        assert_eq!(rule.ref_field, Some(VariableKey::StepsGoal));
        assert_eq!(rule.value, None);
    }

    #[test]
    fn test_replace_operator_rejects_wrong_type() {
        let rule = ConditionRule::literal(VariableKey::UserPlan, OperatorKey::Eq, "pro");
        assert_eq!(rule.clone().replace_operator(OperatorKey::Between), rule);
        assert_eq!(rule.clone().replace_operator(OperatorKey::IsTrue), rule);
    }

    #[test]
    fn test_replace_operator_is_idempotent() {
        for op in [OperatorKey::Between, OperatorKey::Lt, OperatorKey::Eq] {
            let once = leaf(VariableKey::Steps, OperatorKey::Gt, 10).replace_operator(op);
            let twice = once.clone().replace_operator(op);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_toggle_reference_mode() {
        let rule = leaf(VariableKey::Steps, OperatorKey::Lt, 100).toggle_reference_mode();
        assert_eq!(rule.ref_field, Some(VariableKey::StepsGoal));
        assert_eq!(rule.value, None);

        let rule = rule.toggle_reference_mode();
        assert_eq!(rule.ref_field, None);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::int(0))));
    }

    #[test]
    fn test_toggle_reference_mode_without_peer_is_noop() {
        let rule = ConditionRule::literal(VariableKey::UserPlan, OperatorKey::Eq, "pro");
        assert_eq!(rule.clone().toggle_reference_mode(), rule);
    }

    #[test]
    fn test_set_value() {
        let rule = ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal)
            .set_value(Literal::int(5000));
        assert_eq!(rule.ref_field, None);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::int(5000))));

        let unary = ConditionRule::unary(VariableKey::BreakfastLogged, OperatorKey::IsTrue).set_value(Literal::Bool(true));
        assert_eq!(unary.value, None);

        let range = ConditionRule::between(VariableKey::CurrentHour, 6, 9).set_value(Literal::int(7));
        assert_eq!(range.value, Some(ConditionValue::default_range()));
    }

    #[test]
    fn test_normalize_repairs_invalid_leaf() {
        let rule = ConditionRule {
            field: VariableKey::UserPlan,
            op: OperatorKey::Between,
            value: Some(ConditionValue::range(1, 2)),
            ref_field: Some(VariableKey::Steps),
        };
        let rule = rule.normalize();
        assert_eq!(rule.op, OperatorKey::Eq);
        assert_eq!(rule.ref_field, None);
        assert_eq!(rule.value, Some(ConditionValue::Scalar(Literal::from("free"))));
    }

    #[test]
    fn test_insert_toggle_keeps_children() {
        let mut group = ConditionGroup::new(Connector::And);
        let first = leaf(VariableKey::Steps, OperatorKey::Gt, 1);
        let second = leaf(VariableKey::CurrentHour, OperatorKey::Lt, 12);
        group.insert_child(first.clone(), None);
        group.insert_child(second.clone(), None);
        group.toggle_connector();

        assert_eq!(group.operator, Connector::Or);
        assert_eq!(group.rules, vec![first.into(), second.into()]);
    }

    #[test]
    fn test_insert_child_clamps_index() {
        let mut group = ConditionGroup::default();
        group.add_default_rule();
        let at = group.insert_child(leaf(VariableKey::WaterGlasses, OperatorKey::Lt, 4), Some(10));
        assert_eq!(at, 1);
        let at = group.insert_child(leaf(VariableKey::WaterGlasses, OperatorKey::Lt, 2), Some(0));
        assert_eq!(at, 0);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_remove_child_out_of_bounds() {
        let mut group = ConditionGroup::default();
        assert!(group.remove_child(0).is_err());
        group.add_default_rule();
        assert!(group.remove_child(0).is_ok());
        assert!(group.is_empty());
    }

    #[test]
    fn test_reorder_child() {
        let mut group = ConditionGroup::all(vec![
            leaf(VariableKey::Steps, OperatorKey::Gt, 1).into(),
            leaf(VariableKey::Steps, OperatorKey::Gt, 2).into(),
            leaf(VariableKey::Steps, OperatorKey::Gt, 3).into(),
        ]);
        group.reorder_child(0, 2).unwrap();
        let values: Vec<_> = group
            .flatten()
            .iter()
            .map(|r| r.value.clone().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![
                ConditionValue::Scalar(Literal::int(2)),
                ConditionValue::Scalar(Literal::int(3)),
                ConditionValue::Scalar(Literal::int(1)),
            ]
        );
        assert!(group.reorder_child(0, 3).is_err());
    }

    #[test]
    fn test_nested_editing() {
        let mut root = ConditionGroup::default();
        root.add_default_rule();
        root.add_default_group();

        let sub = root.group_at_mut(&[1]).unwrap();
        sub.toggle_connector();
        sub.add_default_rule();

        root.update_rule_at(&[1, 0], |r| r.replace_operator(OperatorKey::Lt))
            .unwrap();

        let node = root.node_at(&[1, 0]).unwrap().as_rule().unwrap();
        assert_eq!(node.field, VariableKey::CurrentHour);
        assert_eq!(node.op, OperatorKey::Lt);
        assert_eq!(root.node_at(&[1]).unwrap().as_group().unwrap().operator, Connector::Or);
        assert!(root.group_at_mut(&[0]).is_none());
        assert!(root.update_rule_at(&[1], |r| r).is_err());
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_flatten_pre_order_and_referenced_fields() {
        let root = ConditionGroup::all(vec![
            leaf(VariableKey::CurrentHour, OperatorKey::Gte, 18).into(),
            ConditionGroup::any(vec![
                ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal).into(),
                ConditionRule::unary(VariableKey::IsWeekend, OperatorKey::IsFalse).into(),
            ])
            .into(),
            leaf(VariableKey::WaterGlasses, OperatorKey::Lt, 3).into(),
        ]);

        let fields: Vec<_> = root.flatten().iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec![
                VariableKey::CurrentHour,
                VariableKey::Steps,
                VariableKey::IsWeekend,
                VariableKey::WaterGlasses,
            ]
        );

        let referenced = root.collect_referenced_fields();
        assert_eq!(referenced.len(), 5);
        assert!(referenced.contains(&VariableKey::StepsGoal));
    }
}
