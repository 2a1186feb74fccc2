//! Per-account rule table

use crate::rule::Rule;
use std::collections::BTreeMap;

/// Rules keyed by priority; at most one rule per priority value and
/// iteration is in ascending priority (1 first).
///
/// Priority bounds are checked by the caller.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: BTreeMap<u8, Rule>,
}

impl RuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `rule` at `priority`, returning the rule it replaced.
    pub fn install(&mut self, rule: Rule, priority: u8) -> Option<Rule> {
        self.rules.insert(priority, rule)
    }

    /// Remove the rule at `priority` only if its criteria equal `rule`'s.
    pub fn erase(&mut self, rule: &Rule, priority: u8) -> bool {
        let matches = self
            .rules
            .get(&priority)
            .is_some_and(|stored| stored.criteria() == rule.criteria());
        if matches {
            self.rules.remove(&priority);
        }
        matches
    }

    #[must_use]
    pub fn get(&self, priority: u8) -> Option<&Rule> {
        self.rules.get(&priority)
    }

    /// Rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Rule)> {
        self.rules.iter().map(|(priority, rule)| (*priority, rule))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
