//! Selector matching against document nodes
//!
//! Matching never mutates the document. Dirty marks and pseudo listener registrations
//! found along the way are collected in [`MatchEffects`] and applied by the caller once
//! the walk is over.

use super::rules::StyleRule;
use super::selector::{Selector, SimpleSelector};
use crate::dom::pseudo::PseudoListener;
use crate::dom::{Document, NodeId};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MatchMode {
    /// Full cascade pass: stateful compounds become pseudo listeners.
    Cascade,
    /// States are ignored, only the tree shape and names count.
    Structural,
    /// Re-evaluation after a state change; no side effects are recorded.
    Live,
}

#[derive(Debug, Default)]
pub(crate) struct MatchEffects {
    pub dirty: Vec<NodeId>,
    pub listeners: Vec<(NodeId, PseudoListener)>,
}

pub(crate) struct MatchContext<'a> {
    doc: &'a Document,
    mode: MatchMode,
    leaf: NodeId,
    rule: Option<Arc<StyleRule>>,
    /// Set when the last successful match went through a pseudo listener.
    pseudo: bool,
    effects: MatchEffects,
}

impl<'a> MatchContext<'a> {
    pub fn new(doc: &'a Document, mode: MatchMode, leaf: NodeId) -> Self {
        Self {
            doc,
            mode,
            leaf,
            rule: None,
            pseudo: false,
            effects: MatchEffects::default(),
        }
    }

    pub fn set_rule(&mut self, rule: &Arc<StyleRule>) {
        self.rule = Some(Arc::clone(rule));
    }

    pub fn matched_pseudo(&self) -> bool {
        self.pseudo
    }

    pub fn into_effects(self) -> MatchEffects {
        self.effects
    }

    /// Matches `selector` with the leaf as subject.
    pub fn matches_leaf(&mut self, selector: &Selector) -> bool {
        self.pseudo = false;
        self.matches(selector, self.leaf)
    }

    fn matches(&mut self, selector: &Selector, node: NodeId) -> bool {
        match selector {
            Selector::Simple(simple) => self.matches_simple(simple, node),
            Selector::Child { parent, child } => {
                if !self.matches_simple(child, node) {
                    return false;
                }
                let Some(parent_id) = self.doc.parent(node) else {
                    self.mark_dirty(node);
                    return false;
                };
                if self.mode == MatchMode::Cascade && selector.is_stateful_compound() {
                    return self.watch_stateful(selector, parent, node);
                }
                if self.matches(parent, parent_id) {
                    return true;
                }
                if self.doc.is_dirty(parent_id) {
                    self.mark_dirty(node);
                }
                false
            }
            Selector::Descendant { ancestor, child } => {
                if !self.matches_simple(child, node) {
                    return false;
                }
                if self.mode == MatchMode::Cascade && selector.is_stateful_compound() {
                    return self.watch_stateful(selector, ancestor, node);
                }
                let mut top = node;
                let mut current = self.doc.parent(node);
                while let Some(id) = current {
                    if self.matches(ancestor, id) {
                        return true;
                    }
                    top = id;
                    current = self.doc.parent(id);
                }
                if top != self.doc.root() {
                    self.mark_dirty(node);
                }
                false
            }
        }
    }

    fn matches_simple(&self, simple: &SimpleSelector, node: NodeId) -> bool {
        let Some(n) = self.doc.node(node) else {
            return false;
        };
        match simple {
            SimpleSelector::Id(id) => n.css_id() == Some(id.as_str()),
            SimpleSelector::Class(class) => n.has_class(class),
            SimpleSelector::Element(tag) => n.tag_name() == tag,
            SimpleSelector::State(inner, state) => {
                self.matches_simple(inner, node) && self.state_allows(node, state)
            }
        }
    }

    fn state_allows(&self, node: NodeId, state: &str) -> bool {
        if self.mode == MatchMode::Structural {
            return true;
        }
        let Some(n) = self.doc.node(node) else {
            return false;
        };
        if let Some(&value) = n.reported_states().get(state) {
            return value;
        }
        match n.component() {
            Some(component) if component.is_realized() => {
                component.state_map().get(state).copied().unwrap_or(false)
            }
            _ if !n.reported_states().is_empty() => false,
            // Nothing reports state for this node, so only its shape is checked.
            _ => true,
        }
    }

    /// Resolves a combinator whose ancestor side carries a state. The rule becomes a
    /// pseudo match for the leaf and listeners are registered on every ancestor that can
    /// hold the state.
    fn watch_stateful(&mut self, selector: &Selector, ancestor_side: &Selector, node: NodeId) -> bool {
        let mut probe = MatchContext::new(self.doc, MatchMode::Structural, self.leaf);
        let structural = probe.matches(selector, node);
        self.effects.dirty.append(&mut probe.effects.dirty);
        if !structural {
            return false;
        }

        let mut state_selectors = Vec::new();
        collect_state_selectors(ancestor_side, &mut state_selectors);
        if let Some(rule) = &self.rule {
            let mut current = self.doc.parent(node);
            while let Some(id) = current {
                if state_selectors.iter().any(|s| probe.matches_simple(s, id)) {
                    let listener = PseudoListener::new(selector.clone(), self.leaf, Arc::clone(rule));
                    self.effects.listeners.push((id, listener));
                }
                current = self.doc.parent(id);
            }
        }
        self.pseudo = true;
        true
    }

    fn mark_dirty(&mut self, node: NodeId) {
        if self.mode != MatchMode::Live {
            self.effects.dirty.push(node);
        }
    }
}

fn collect_state_selectors<'s>(selector: &'s Selector, out: &mut Vec<&'s SimpleSelector>) {
    let (rest, simple) = match selector {
        Selector::Simple(simple) => (None, simple),
        Selector::Child { parent, child } => (Some(parent), child),
        Selector::Descendant { ancestor, child } => (Some(ancestor), child),
    };
    if simple.has_state() {
        out.push(simple);
    }
    if let Some(rest) = rest {
        collect_state_selectors(rest, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::parse_selector_list;
    use std::collections::HashMap;

    fn selector(text: &str) -> Selector {
        parse_selector_list(text).remove(0)
    }

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let page = doc.create_node("div");
        doc.set_css_class(page, "doc-page");
        let item = doc.create_node("div");
        doc.set_css_id(item, "idTest1");
        let text = doc.create_node("text");
        doc.set_css_class(text, "label big");
        doc.append_child(doc.root(), page);
        doc.append_child(page, item);
        doc.append_child(item, text);
        (doc, page, item, text)
    }

    #[test]
    fn simple_and_combinators() {
        let (doc, _, item, text) = sample();
        let mut ctx = MatchContext::new(&doc, MatchMode::Cascade, text);
        assert!(ctx.matches_leaf(&selector(".big")));
        assert!(ctx.matches_leaf(&selector("div text")));
        assert!(ctx.matches_leaf(&selector(".doc-page #idTest1 > .label")));
        assert!(!ctx.matches_leaf(&selector(".doc-page > text")));
        assert!(!ctx.matches_leaf(&selector("#idTest1")));

        let mut ctx = MatchContext::new(&doc, MatchMode::Cascade, item);
        assert!(ctx.matches_leaf(&selector(".doc-page > #idTest1")));
        assert!(ctx.into_effects().dirty.is_empty());
    }

    #[test]
    fn detached_chain_marks_dirty() {
        let mut doc = Document::new();
        let parent = doc.create_node("div");
        let child = doc.create_node("text");
        doc.append_child(parent, child);

        let mut ctx = MatchContext::new(&doc, MatchMode::Cascade, child);
        assert!(ctx.matches_leaf(&selector("div > text")));
        assert!(!ctx.matches_leaf(&selector(".page text")));
        assert_eq!(ctx.into_effects().dirty, vec![child]);

        let mut ctx = MatchContext::new(&doc, MatchMode::Cascade, parent);
        assert!(!ctx.matches_leaf(&selector("div > div")));
        assert_eq!(ctx.into_effects().dirty, vec![parent]);
    }

    #[test]
    fn component_less_state_matches_structurally() {
        let (mut doc, _, item, text) = sample();
        {
            let mut ctx = MatchContext::new(&doc, MatchMode::Live, text);
            assert!(ctx.matches_leaf(&selector("#idTest1:active .label")));
        }

        doc.record_states(item, &HashMap::from([("focus".to_string(), true)]));
        let mut ctx = MatchContext::new(&doc, MatchMode::Live, text);
        assert!(!ctx.matches_leaf(&selector("#idTest1:active .label")));
        assert!(ctx.matches_leaf(&selector("#idTest1:focus .label")));
    }

    #[test]
    fn stateful_compound_registers_listeners() {
        let (doc, _, item, text) = sample();
        let rule = Arc::new(StyleRule::new(
            parse_selector_list("#idTest1:active .label"),
            Default::default(),
            "#idTest1:active .label".to_string(),
            0,
        ));
        let mut ctx = MatchContext::new(&doc, MatchMode::Cascade, text);
        ctx.set_rule(&rule);
        assert!(ctx.matches_leaf(&rule.selectors()[0]));
        assert!(ctx.matched_pseudo());
        let effects = ctx.into_effects();
        assert_eq!(effects.listeners.len(), 1);
        assert_eq!(effects.listeners[0].0, item);
        assert_eq!(effects.listeners[0].1.leaf(), text);
    }
}
