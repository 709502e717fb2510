use super::rules::StyleRule;
use std::sync::Arc;

/// Multiplier applied to the winning specificity in the inspector score.
pub const SCORE_ORDER_OFFSET: u64 = 1_000_000;

/// Cascade priority: specificity, then `@MEDIA` membership, then rule order.
pub type Priority = (u64, bool, u64);

/// A rule that matched a node, with the specificity of its best selector.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedRule {
    rule: Arc<StyleRule>,
    specificity: u64,
    pseudo_key: Option<String>,
}

impl MatchedRule {
    pub fn new(rule: Arc<StyleRule>, specificity: u64, pseudo_key: Option<String>) -> Self {
        Self {
            rule,
            specificity,
            pseudo_key,
        }
    }

    pub fn rule(&self) -> &Arc<StyleRule> {
        &self.rule
    }

    pub fn specificity(&self) -> u64 {
        self.specificity
    }

    pub fn priority(&self) -> Priority {
        (self.specificity, self.rule.in_media(), self.rule.order())
    }

    /// Flattened priority shown by the inspector. Orders past the offset are clamped, so
    /// the number can tie where [`priority`](Self::priority) does not.
    pub fn score(&self) -> u64 {
        self.specificity
            .saturating_mul(SCORE_ORDER_OFFSET)
            .saturating_add(self.rule.order().min(SCORE_ORDER_OFFSET - 1))
    }

    /// Set when the rule only applies through a pseudo-state listener.
    pub fn pseudo_key(&self) -> Option<&str> {
        self.pseudo_key.as_deref()
    }
}

/// Matched rules in ascending cascade priority.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchedRuleList {
    rules: Vec<MatchedRule>,
}

impl MatchedRuleList {
    /// Sorts by priority; the sort is stable, so equal priorities keep collection order.
    pub fn new(mut rules: Vec<MatchedRule>) -> Self {
        rules.sort_by_key(MatchedRule::priority);
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MatchedRule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchedRule> {
        self.rules.iter()
    }

    /// Highest priority first, the order the inspector shows.
    pub fn descending(&self) -> impl Iterator<Item = &MatchedRule> {
        self.rules.iter().rev()
    }
}

impl<'a> IntoIterator for &'a MatchedRuleList {
    type Item = &'a MatchedRule;
    type IntoIter = std::slice::Iter<'a, MatchedRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
