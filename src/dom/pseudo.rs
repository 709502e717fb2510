//! Pseudo-state listeners
//!
//! A rule like `.btn:active .label` cannot be folded into the label's style once: it
//! depends on a state of the button that changes without any re-cascade. The cascade
//! registers a listener on the button instead, and a state change on the button re-runs the
//! selector and pushes the rule's style straight to the label's component.

use super::component::PendingStyle;
use super::{Document, NodeId};
use crate::css::calculator::expand_derived_properties;
use crate::css::declaration::StyleDeclaration;
use crate::css::matching::{MatchContext, MatchMode};
use crate::css::rules::StyleRule;
use crate::css::selector::Selector;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity of a listener: the same rule on the same leaf is registered once per holder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    selector: Selector,
    leaf: NodeId,
    order: u64,
}

#[derive(Clone, Debug)]
pub struct PseudoListener {
    selector: Selector,
    leaf: NodeId,
    rule: Arc<StyleRule>,
}

impl PseudoListener {
    pub fn new(selector: Selector, leaf: NodeId, rule: Arc<StyleRule>) -> Self {
        Self {
            selector,
            leaf,
            rule,
        }
    }

    pub fn key(&self) -> ListenerKey {
        ListenerKey {
            selector: self.selector.clone(),
            leaf: self.leaf,
            order: self.rule.order(),
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn leaf(&self) -> NodeId {
        self.leaf
    }

    pub fn rule(&self) -> &Arc<StyleRule> {
        &self.rule
    }

    /// Key under which the component receives this listener's styles.
    pub fn pseudo_key(&self) -> String {
        self.selector.to_string()
    }

    /// Re-evaluates the selector for the leaf against the states currently known in `doc`.
    pub fn state_changed(&self, doc: &Document) -> bool {
        MatchContext::new(doc, MatchMode::Live, self.leaf).matches_leaf(&self.selector)
    }
}

pub type ListenerRegistry = IndexMap<ListenerKey, PseudoListener>;

impl Document {
    /// Propagates pseudo-state changes of `node` to the leaves listening on it.
    ///
    /// `states` only carries the states that changed; it is merged over what the node
    /// reported before. Listeners targeting the same leaf and subject are grouped: the
    /// group is satisfied if any member matches, otherwise the leaf goes back to its normal
    /// styles. Nodes other than the listening leaves are not touched.
    pub fn handle_state_changed(&mut self, node: NodeId, states: &HashMap<String, bool>) {
        self.record_states(node, states);
        let Some(n) = self.node(node) else {
            return;
        };
        if n.pseudo_listeners().is_empty() {
            return;
        }

        let mut groups: IndexMap<(NodeId, String), Vec<(PseudoListener, bool)>> = IndexMap::new();
        for listener in n.pseudo_listeners().values() {
            let satisfied = listener.state_changed(self);
            let group = (listener.leaf(), listener.selector().subject().to_string());
            groups
                .entry(group)
                .or_default()
                .push((listener.clone(), satisfied));
        }

        for ((leaf, subject), members) in groups {
            if members.iter().any(|(_, satisfied)| *satisfied) {
                for (listener, _) in members.into_iter().filter(|(_, satisfied)| *satisfied) {
                    self.apply_pseudo_styles(&listener);
                }
            } else {
                debug!(target: "dom", "Node {} back to normal state for {}", leaf, subject);
                self.make_normal_state(leaf);
            }
        }
    }

    fn apply_pseudo_styles(&mut self, listener: &PseudoListener) {
        let leaf = listener.leaf();
        let sheets = self.matched_style_sheet(leaf);
        let mut declaration: StyleDeclaration = listener
            .rule()
            .declaration()
            .properties()
            .filter(|p| !p.disabled())
            .cloned()
            .collect();
        expand_derived_properties(&mut declaration, &sheets);

        let key = listener.pseudo_key();
        let Some(node) = self.node_mut(leaf) else {
            return;
        };
        node.pending = PendingStyle::None;
        match node.component.as_deref_mut() {
            Some(component) if component.is_realized() => {
                debug!(target: "dom", "Applying pseudo styles {} to node {}", key, leaf);
                component.apply_pseudo_styles(&key, &declaration);
            }
            _ => node.pending = PendingStyle::Pseudo { key, declaration },
        }
    }

    fn make_normal_state(&mut self, leaf: NodeId) {
        let Some(node) = self.node_mut(leaf) else {
            return;
        };
        node.pending = PendingStyle::None;
        match node.component.as_deref_mut() {
            Some(component) if component.is_realized() => component.restore_styles(),
            _ => node.pending = PendingStyle::Normal,
        }
    }

    /// Merges `states` into the states reported for `node`.
    pub fn record_states(&mut self, node: NodeId, states: &HashMap<String, bool>) {
        if let Some(n) = self.node_mut(node) {
            n.reported_states
                .extend(states.iter().map(|(state, &value)| (state.clone(), value)));
        }
    }

    pub(crate) fn register_listener(&mut self, holder: NodeId, listener: PseudoListener) {
        let leaf = listener.leaf();
        let Some(node) = self.node_mut(holder) else {
            return;
        };
        node.pseudo_listeners.insert(listener.key(), listener);
        if let Some(node) = self.node_mut(leaf) {
            node.listener_holders.insert(holder);
        }
    }

    /// Drops every listener whose leaf is `leaf`, wherever it is registered.
    pub(crate) fn release_listeners_for(&mut self, leaf: NodeId) {
        let Some(holders) = self.node_mut(leaf).map(|n| std::mem::take(&mut n.listener_holders)) else {
            return;
        };
        for holder in holders {
            if let Some(node) = self.node_mut(holder) {
                node.pseudo_listeners.retain(|key, _| key.leaf != leaf);
            }
        }
    }
}
