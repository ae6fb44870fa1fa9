//! Remaining split rules, grouped by category

use std::collections::BTreeMap;

use super::types::{SplitCategory, SplitRule};

/// Configured splits that have not fired yet
///
/// Each rule is consumed at most once. Within a category, rules keep their
/// configured order and the first matching one is consumed. A category whose
/// last rule was consumed is reported absent.
#[derive(Debug, Clone, Default)]
pub struct SplitRuleSet {
    remaining: BTreeMap<SplitCategory, Vec<SplitRule>>,
}

impl SplitRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule set holding `rules`
    pub fn from_rules(rules: &[SplitRule]) -> Self {
        let mut set = Self::new();
        set.setup(rules);
        set
    }

    /// Replace the content with `rules`
    pub fn setup(&mut self, rules: &[SplitRule]) {
        self.remaining.clear();
        for rule in rules {
            self.remaining.entry(rule.category).or_default().push(rule.clone());
        }
    }

    /// Number of rules not yet consumed
    pub fn remaining_count(&self) -> usize {
        self.remaining.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Whether any rule of `category` remains
    pub fn has_category(&self, category: SplitCategory) -> bool {
        self.remaining.contains_key(&category)
    }

    /// Remaining rules of `category` in configured order
    pub fn rules(&self, category: SplitCategory) -> &[SplitRule] {
        self.remaining.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove and return the first rule of `category` matching `identifier`
    ///
    /// Categories that don't take an identifier match their first rule.
    pub fn take(&mut self, category: SplitCategory, identifier: &str) -> Option<SplitRule> {
        let rules = self.remaining.get_mut(&category)?;
        let index = if category.takes_identifier() {
            rules.iter().position(|r| r.identifier == identifier)?
        } else {
            0
        };

        let rule = rules.remove(index);
        if rules.is_empty() {
            self.remaining.remove(&category);
        }
        Some(rule)
    }

    /// Consume the first rule of `category` matching `identifier`
    pub fn consume(&mut self, category: SplitCategory, identifier: &str) -> bool {
        self.take(category, identifier).is_some()
    }
}
