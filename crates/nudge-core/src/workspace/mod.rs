//! The editor's working set of rules.
//!
//! Holds the locally edited rules with their dirty and saving flags. Edits
//! are synchronous; saves and deletes go to the store asynchronously. Each
//! rule's flags are independent, so saving one rule never blocks editing or
//! saving another. The internal lock is never held across an await.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{NudgeError, NudgeResult};
use crate::rule::{
    duplicate_rule, normalize_rule_id, RuleRow, RuleState, RuleValidator, TriggerRule,
};
use crate::traits::{Principal, RuleStore};

#[derive(Debug, Default)]
struct WorkingSet {
    rules: Vec<TriggerRule>,
    active: Option<String>,
    dirty: HashSet<String>,
    saving: HashSet<String>,
    /// Bumped on every local edit; lets a finishing save tell whether the
    /// rule changed while it was in flight.
    revisions: HashMap<String, u64>,
}

impl WorkingSet {
    fn position(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.id == id)
    }

    fn ids(&self) -> HashSet<String> {
        self.rules.iter().map(|r| r.id.clone()).collect()
    }

    fn touch(&mut self, id: &str) {
        self.dirty.insert(id.to_string());
        *self.revisions.entry(id.to_string()).or_insert(0) += 1;
    }

    fn revision(&self, id: &str) -> u64 {
        self.revisions.get(id).copied().unwrap_or(0)
    }

    fn push_front(&mut self, rule: TriggerRule) {
        let id = rule.id.clone();
        self.rules.insert(0, rule);
        self.active = Some(id.clone());
        self.touch(&id);
    }
}

/// Clears the saving flag for one id when dropped, whatever the outcome.
struct SavingGuard<'a> {
    state: &'a Mutex<WorkingSet>,
    rule_id: String,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.saving.remove(&self.rule_id);
    }
}

/// Working set of rules backed by a [`RuleStore`].
pub struct RuleWorkspace<S: RuleStore> {
    store: S,
    validator: RuleValidator,
    state: Mutex<WorkingSet>,
}

impl<S: RuleStore> RuleWorkspace<S> {
    pub fn new(store: S, validator: RuleValidator) -> Self {
        Self {
            store,
            validator,
            state: Mutex::new(WorkingSet::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn validator(&self) -> &RuleValidator {
        &self.validator
    }

    fn lock(&self) -> MutexGuard<'_, WorkingSet> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the working set with the store's contents.
    ///
    /// An empty store yields the seed rule, marked dirty because it has not
    /// been stored yet.
    pub async fn load(&self) -> NudgeResult<Vec<TriggerRule>> {
        let rows = self.store.list().await.map_err(|e| {
            warn!(error = %e, "Failed to load rules");
            e
        })?;
        let seeded = rows.is_empty();
        let rules: Vec<TriggerRule> = if seeded {
            vec![TriggerRule::seed()]
        } else {
            rows.into_iter().map(RuleRow::into_rule).collect()
        };

        let mut state = self.lock();
        state.rules = rules.clone();
        state.active = rules.first().map(|r| r.id.clone());
        state.dirty.clear();
        state.revisions.clear();
        if seeded {
            if let Some(seed) = rules.first() {
                state.touch(&seed.id);
            }
        }
        info!(count = rules.len(), seeded, "Loaded rules");
        Ok(rules)
    }

    /// Create a blank rule with a fresh id and make it active.
    pub fn add_rule(&self) -> TriggerRule {
        let mut state = self.lock();
        let id = normalize_rule_id(&TriggerRule::fresh_id(Utc::now()), &state.ids());
        let rule = TriggerRule::new_empty(id);
        state.push_front(rule.clone());
        debug!(rule_id = %rule.id, "Added rule");
        rule
    }

    /// Insert a rule as-is at the top of the list and make it active.
    pub fn insert_rule(&self, rule: TriggerRule) {
        debug!(rule_id = %rule.id, "Inserted rule");
        self.lock().push_front(rule);
    }

    /// Replace the rule currently stored under `original_id`.
    ///
    /// The replacement may carry a different id; the active selection and
    /// the dirty flag follow it.
    pub fn update_rule(&self, original_id: &str, rule: TriggerRule) -> NudgeResult<()> {
        let mut state = self.lock();
        let idx = state
            .position(original_id)
            .ok_or_else(|| NudgeError::not_found(original_id))?;

        let new_id = rule.id.clone();
        state.rules[idx] = rule;
        if new_id != original_id {
            state.dirty.remove(original_id);
            state.revisions.remove(original_id);
            if state.active.as_deref() == Some(original_id) {
                state.active = Some(new_id.clone());
            }
            debug!(from = %original_id, to = %new_id, "Rule id changed");
        }
        state.touch(&new_id);
        Ok(())
    }

    /// Apply `edit` to a copy of the rule and store the result.
    pub fn edit_rule(&self, id: &str, edit: impl FnOnce(&mut TriggerRule)) -> NudgeResult<TriggerRule> {
        let mut rule = self.get(id).ok_or_else(|| NudgeError::not_found(id))?;
        edit(&mut rule);
        self.update_rule(id, rule.clone())?;
        Ok(rule)
    }

    /// Copy a rule under a fresh `<id>_copy` id.
    pub fn duplicate_rule(&self, id: &str) -> NudgeResult<TriggerRule> {
        let mut state = self.lock();
        let idx = state.position(id).ok_or_else(|| NudgeError::not_found(id))?;
        let copy = duplicate_rule(&state.rules[idx], &state.ids());
        state.push_front(copy.clone());
        debug!(source = %id, rule_id = %copy.id, "Duplicated rule");
        Ok(copy)
    }

    /// Validate a generated candidate and add it under a unique id.
    pub fn accept_generated(&self, candidate: TriggerRule) -> NudgeResult<TriggerRule> {
        let report = self.validator.validate(&candidate);
        if !report.is_valid() {
            return Err(NudgeError::generation_invalid(
                format!("generated rule '{}' is invalid", candidate.id),
                report.errors,
            ));
        }

        let mut state = self.lock();
        let id = normalize_rule_id(&candidate.id, &state.ids());
        let rule = TriggerRule { id, ..candidate };
        state.push_front(rule.clone());
        info!(rule_id = %rule.id, "Accepted generated rule");
        Ok(rule)
    }

    /// Validate and persist one rule.
    ///
    /// On failure the local rule and its dirty flag are kept so the save can
    /// be retried. A rule edited while its save was in flight stays dirty.
    pub async fn save_rule(&self, principal: &Principal, id: &str) -> NudgeResult<RuleRow> {
        principal.require_write("save rules")?;

        let (rule, revision) = {
            let mut state = self.lock();
            let idx = state.position(id).ok_or_else(|| NudgeError::not_found(id))?;
            if state.saving.contains(id) {
                return Err(NudgeError::SaveInProgress {
                    rule_id: id.to_string(),
                });
            }
            if state.rules.iter().filter(|r| r.id == id).count() > 1 {
                return Err(NudgeError::duplicate_id(id));
            }
            let rule = state.rules[idx].clone();
            self.validator.validate(&rule).into_result()?;
            state.saving.insert(id.to_string());
            (rule, state.revision(id))
        };
        let _guard = SavingGuard {
            state: &self.state,
            rule_id: id.to_string(),
        };

        match self.store.upsert(&rule).await {
            Ok(row) => {
                let mut state = self.lock();
                if state.revision(id) == revision {
                    state.dirty.remove(id);
                } else {
                    debug!(rule_id = %id, "Rule edited during save; keeping it dirty");
                }
                info!(rule_id = %id, "Saved rule");
                Ok(row)
            }
            Err(e) => {
                warn!(rule_id = %id, error = %e, "Failed to save rule");
                Err(e)
            }
        }
    }

    /// Delete a rule from the store, then from the working set.
    pub async fn delete_rule(&self, principal: &Principal, id: &str) -> NudgeResult<()> {
        principal.require_write("delete rules")?;

        {
            let state = self.lock();
            if state.position(id).is_none() {
                return Err(NudgeError::not_found(id));
            }
            if state.saving.contains(id) {
                return Err(NudgeError::SaveInProgress {
                    rule_id: id.to_string(),
                });
            }
        }

        self.store.remove(id).await.map_err(|e| {
            warn!(rule_id = %id, error = %e, "Failed to delete rule");
            e
        })?;

        let mut state = self.lock();
        state.rules.retain(|r| r.id != id);
        state.dirty.remove(id);
        state.revisions.remove(id);
        if state.active.as_deref() == Some(id) {
            state.active = state.rules.first().map(|r| r.id.clone());
        }
        info!(rule_id = %id, "Deleted rule");
        Ok(())
    }

    pub fn rules(&self) -> Vec<TriggerRule> {
        self.lock().rules.clone()
    }

    pub fn get(&self, id: &str) -> Option<TriggerRule> {
        let state = self.lock();
        state.position(id).map(|idx| state.rules[idx].clone())
    }

    pub fn active_rule_id(&self) -> Option<String> {
        self.lock().active.clone()
    }

    pub fn set_active(&self, id: Option<&str>) -> NudgeResult<()> {
        let mut state = self.lock();
        match id {
            Some(id) if state.position(id).is_none() => Err(NudgeError::not_found(id)),
            _ => {
                state.active = id.map(str::to_string);
                Ok(())
            }
        }
    }

    pub fn is_dirty(&self, id: &str) -> bool {
        self.lock().dirty.contains(id)
    }

    pub fn is_saving(&self, id: &str) -> bool {
        self.lock().saving.contains(id)
    }

    /// Ids with unsaved edits, sorted.
    pub fn dirty_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().dirty.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Authoring state of a rule, `None` if it is not in the working set.
    pub fn state(&self, id: &str) -> Option<RuleState> {
        let state = self.lock();
        let idx = state.position(id)?;
        if state.saving.contains(id) {
            return Some(RuleState::Saving);
        }
        if !state.dirty.contains(id) {
            return Some(RuleState::Saved);
        }
        if self.validator.validate(&state.rules[idx]).is_valid() {
            Some(RuleState::Valid)
        } else {
            Some(RuleState::Draft)
        }
    }
}
