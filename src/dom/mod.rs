pub mod component;
pub mod pseudo;

use crate::css::calculator::{collect_matched_rules, expand_derived_properties, merge_final_style};
use crate::css::declaration::StyleDeclaration;
use crate::css::matched::MatchedRuleList;
use crate::css::media::MediaEnvironment;
use crate::css::parser::parse_inline_style;
use crate::css::stylesheet::{MatchedStyleSheet, StyleSheet};
use component::{Component, PendingStyle};
use indexmap::IndexSet;
use log::{debug, trace, warn};
use pseudo::ListenerRegistry;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const DOCUMENT_TAG: &str = "#document";

/// Stable handle to a node inside its [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Node {
    tag_name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    css_id: Option<String>,
    css_class: Vec<String>,
    inline_style: StyleDeclaration,
    final_style: StyleDeclaration,
    dirty: bool,
    restyling: bool,
    pub(crate) component: Option<Box<dyn Component>>,
    pub(crate) pending: PendingStyle,
    pub(crate) pseudo_listeners: ListenerRegistry,
    /// Nodes holding listeners whose leaf is this node.
    pub(crate) listener_holders: IndexSet<NodeId>,
    pub(crate) reported_states: HashMap<String, bool>,
    style_sheet: Option<Arc<StyleSheet>>,
    matched: Option<MatchedRuleList>,
}

impl Node {
    fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            parent: None,
            children: Vec::new(),
            css_id: None,
            css_class: Vec::new(),
            inline_style: StyleDeclaration::new(),
            final_style: StyleDeclaration::new(),
            dirty: true,
            restyling: false,
            component: None,
            pending: PendingStyle::None,
            pseudo_listeners: ListenerRegistry::new(),
            listener_holders: IndexSet::new(),
            reported_states: HashMap::new(),
            style_sheet: None,
            matched: None,
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn css_id(&self) -> Option<&str> {
        self.css_id.as_deref()
    }

    pub fn css_class(&self) -> &[String] {
        &self.css_class
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.css_class.iter().any(|c| c == class)
    }

    pub fn inline_style(&self) -> &StyleDeclaration {
        &self.inline_style
    }

    pub fn final_style(&self) -> &StyleDeclaration {
        &self.final_style
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_restyling(&self) -> bool {
        self.restyling
    }

    pub fn component(&self) -> Option<&dyn Component> {
        self.component.as_deref()
    }

    pub fn pending_style(&self) -> &PendingStyle {
        &self.pending
    }

    pub fn pseudo_listeners(&self) -> &ListenerRegistry {
        &self.pseudo_listeners
    }

    /// States merged from every change set reported for this node.
    pub fn reported_states(&self) -> &HashMap<String, bool> {
        &self.reported_states
    }

    /// The sheet attached to this node itself, if any.
    pub fn style_sheet(&self) -> Option<&Arc<StyleSheet>> {
        self.style_sheet.as_ref()
    }

    /// Rules from the last cascade pass.
    pub fn matched_rules(&self) -> Option<&MatchedRuleList> {
        self.matched.as_ref()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("tag_name", &self.tag_name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("css_id", &self.css_id)
            .field("css_class", &self.css_class)
            .field("dirty", &self.dirty)
            .field("has_component", &self.component.is_some())
            .finish()
    }
}

/// Arena of nodes. Node 0 is the document root and is never removed.
#[derive(Debug)]
pub struct Document {
    pub(crate) nodes: Vec<Option<Node>>,
    style_sheets: Vec<Arc<StyleSheet>>,
    media: MediaEnvironment,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_media(MediaEnvironment::default())
    }

    pub fn with_media(media: MediaEnvironment) -> Self {
        Self {
            nodes: vec![Some(Node::new(DOCUMENT_TAG))],
            style_sheets: Vec::new(),
            media,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_dirty)
    }

    pub fn create_node(&mut self, tag_name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(tag_name)));
        trace!(target: "dom", "Created node {} <{}>", id, tag_name);
        id
    }

    /// Appends `child` under `parent`, detaching it from any previous parent first.
    /// Appending a child that is already in place changes nothing.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) || child == self.root() {
            return false;
        }
        if self.is_ancestor(child, parent) {
            warn!(target: "dom", "Refusing to append {} under its own descendant {}", child, parent);
            return false;
        }
        if self.parent(child) == Some(parent) {
            return true;
        }
        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        self.mark_subtree_dirty(child);
        true
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(p) = self.node_mut(parent) else {
            return false;
        };
        let before = p.children.len();
        p.children.retain(|&c| c != child);
        if p.children.len() == before {
            return false;
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = None;
        }
        self.mark_subtree_dirty(child);
        true
    }

    /// Removes `id` and its whole subtree from the document.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id == self.root() || !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
        let removed = self.subtree(id);
        for &node_id in &removed {
            self.release_listeners_for(node_id);
        }
        for &node_id in &removed {
            let Some(node) = self.nodes.get_mut(node_id.0).and_then(Option::take) else {
                continue;
            };
            if let Some(sheet) = &node.style_sheet {
                sheet.remove_owner(node_id);
            }
            for listener in node.pseudo_listeners.values() {
                if let Some(leaf) = self.node_mut(listener.leaf()) {
                    leaf.listener_holders.shift_remove(&node_id);
                }
            }
        }
        debug!(target: "dom", "Removed {} nodes under {}", removed.len(), id);
        true
    }

    /// `id` and all its descendants, in tree order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn mark_subtree_dirty(&mut self, id: NodeId) {
        for node_id in self.subtree(id) {
            if let Some(node) = self.node_mut(node_id) {
                node.dirty = true;
            }
        }
    }

    fn mark_all_dirty(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.dirty = true;
        }
    }

    pub fn set_css_id(&mut self, id: NodeId, css_id: &str) {
        let css_id = css_id.trim();
        if let Some(node) = self.node_mut(id) {
            node.css_id = (!css_id.is_empty()).then(|| css_id.to_string());
        }
        self.mark_subtree_dirty(id);
    }

    pub fn set_css_class(&mut self, id: NodeId, classes: &str) {
        if let Some(node) = self.node_mut(id) {
            node.css_class = classes.split_whitespace().map(str::to_string).collect();
        }
        self.mark_subtree_dirty(id);
    }

    /// Appends a document-level sheet; later sheets have higher priority.
    pub fn add_style_sheet(&mut self, sheet: Arc<StyleSheet>) {
        sheet.add_owner(self.root());
        self.style_sheets.push(sheet);
        self.mark_all_dirty();
    }

    pub fn style_sheets(&self) -> &[Arc<StyleSheet>] {
        &self.style_sheets
    }

    /// Attaches a node-level sheet to `id`; its descendants use it too unless they carry
    /// their own.
    pub fn set_style_sheet(&mut self, id: NodeId, sheet: Option<Arc<StyleSheet>>) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if let Some(old) = node.style_sheet.take() {
            old.remove_owner(id);
        }
        if let Some(sheet) = &sheet {
            sheet.add_owner(id);
        }
        node.style_sheet = sheet;
        self.mark_subtree_dirty(id);
    }

    /// The sheets that apply to `id`: document sheets, then the nearest node-level sheet.
    pub fn matched_style_sheet(&self, id: NodeId) -> MatchedStyleSheet {
        let mut current = Some(id);
        let mut node_sheet = None;
        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else {
                break;
            };
            if let Some(sheet) = &node.style_sheet {
                node_sheet = Some(Arc::clone(sheet));
                break;
            }
            current = node.parent;
        }
        MatchedStyleSheet::new(self.style_sheets.clone(), node_sheet)
    }

    pub fn media_environment(&self) -> &MediaEnvironment {
        &self.media
    }

    /// Media conditions are evaluated on every cascade, so every node needs a restyle.
    pub fn set_media_environment(&mut self, media: MediaEnvironment) {
        self.media = media;
        self.mark_all_dirty();
    }

    /// Replaces the inline style of `id` from a JSON object and restyles the node.
    pub fn set_inline_style(&mut self, id: NodeId, style: &Map<String, Value>) {
        self.replace_inline_styles(id, parse_inline_style(style));
    }

    /// Merges `declaration` into the inline style of `id` and restyles the node.
    pub fn update_inline_styles(&mut self, id: NodeId, declaration: &StyleDeclaration) {
        let mut declaration = declaration.clone();
        expand_derived_properties(&mut declaration, &self.matched_style_sheet(id));
        if let Some(node) = self.node_mut(id) {
            node.inline_style.set_all(&declaration);
        }
        self.restyle(id);
    }

    /// Replaces the inline style of `id` and restyles the node.
    pub fn replace_inline_styles(&mut self, id: NodeId, mut declaration: StyleDeclaration) {
        expand_derived_properties(&mut declaration, &self.matched_style_sheet(id));
        if let Some(node) = self.node_mut(id) {
            node.inline_style = declaration;
        }
        self.restyle(id);
    }

    /// Binds the view of `id`, delivering any style update buffered while it was absent.
    pub fn bind_component(&mut self, id: NodeId, mut component: Box<dyn Component>) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if component.is_realized() {
            std::mem::take(&mut node.pending).deliver(&mut *component);
        }
        node.component = Some(component);
    }

    pub fn unbind_component(&mut self, id: NodeId) -> Option<Box<dyn Component>> {
        self.node_mut(id).and_then(|node| node.component.take())
    }

    /// Matches rules for `id`, applying dirty marks and listener registrations.
    pub fn cal_matched_styles(&mut self, id: NodeId) -> MatchedRuleList {
        let (matched, effects) = collect_matched_rules(self, id);
        self.release_listeners_for(id);
        for dirty in effects.dirty {
            if let Some(node) = self.node_mut(dirty) {
                node.dirty = true;
            }
        }
        for (holder, listener) in effects.listeners {
            self.register_listener(holder, listener);
        }
        matched
    }

    /// Recomputes the final style of `id` from `matched` and its inline style.
    pub fn cal_final_style(&mut self, id: NodeId, matched: &MatchedRuleList) -> Option<&StyleDeclaration> {
        let sheets = self.matched_style_sheet(id);
        let node = self.node_mut(id)?;
        let mut final_style = std::mem::take(&mut node.final_style);
        merge_final_style(&mut final_style, matched, &node.inline_style, &sheets);
        node.final_style = final_style;
        Some(&node.final_style)
    }

    /// Full cascade for one node. A node already being restyled is skipped.
    pub fn restyle(&mut self, id: NodeId) -> bool {
        match self.node_mut(id) {
            Some(node) if !node.restyling => {
                node.restyling = true;
                node.dirty = false;
            }
            _ => return false,
        }
        let matched = self.cal_matched_styles(id);
        self.cal_final_style(id, &matched);
        if let Some(node) = self.node_mut(id) {
            node.matched = Some(matched);
            node.restyling = false;
        }
        true
    }

    /// Restyles every node currently marked dirty, in tree order, detached nodes last.
    /// Returns the number of nodes restyled.
    pub fn restyle_dirty(&mut self) -> usize {
        let mut order = self.subtree(self.root());
        let attached: std::collections::HashSet<_> = order.iter().copied().collect();
        order.extend(
            (0..self.nodes.len())
                .map(NodeId)
                .filter(|id| self.contains(*id) && !attached.contains(id)),
        );
        let dirty: Vec<_> = order.into_iter().filter(|&id| self.is_dirty(id)).collect();
        let count = dirty.iter().filter(|&&id| self.restyle(id)).count();
        debug!(target: "dom", "Restyled {} dirty nodes", count);
        count
    }
}
