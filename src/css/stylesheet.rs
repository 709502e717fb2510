use super::property::PropertyValue;
use super::rules::{FontFaceRule, KeyframesRule, MediaRule, RuleList, StyleRule};
use crate::dom::NodeId;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// A parsed style sheet, shared between the nodes that use it.
///
/// The owner set is a lookup index of the nodes the sheet is attached to; it does not keep
/// them alive.
#[derive(Debug)]
pub struct StyleSheet {
    rules: RuleList,
    style_object_id: Option<i64>,
    owners: Mutex<HashSet<NodeId>>,
}

impl StyleSheet {
    pub fn new(rules: RuleList, style_object_id: Option<i64>) -> Self {
        Self {
            rules,
            style_object_id,
            owners: Mutex::new(HashSet::new()),
        }
    }

    pub fn rules(&self) -> &RuleList {
        &self.rules
    }

    pub fn style_object_id(&self) -> Option<i64> {
        self.style_object_id
    }

    pub fn style_rules(&self) -> impl Iterator<Item = &Arc<StyleRule>> {
        self.rules.style_rules()
    }

    pub fn media_rules(&self) -> impl Iterator<Item = &MediaRule> {
        self.rules.media_rules()
    }

    pub fn keyframes_rule(&self) -> Option<&KeyframesRule> {
        self.rules.keyframes_rule()
    }

    pub fn font_face_rule(&self) -> Option<&FontFaceRule> {
        self.rules.font_face_rule()
    }

    pub fn add_owner(&self, node: NodeId) {
        self.owners.lock().insert(node);
    }

    pub fn remove_owner(&self, node: NodeId) {
        self.owners.lock().remove(&node);
    }

    pub fn has_owner(&self, node: NodeId) -> bool {
        self.owners.lock().contains(&node)
    }

    /// Snapshot of the current owners.
    pub fn owners(&self) -> Vec<NodeId> {
        let mut owners: Vec<_> = self.owners.lock().iter().copied().collect();
        owners.sort();
        owners
    }
}

/// Sheets that apply to one node: document-level sheets in ascending priority, then the
/// node-level sheet.
#[derive(Clone, Debug, Default)]
pub struct MatchedStyleSheet {
    document: Vec<Arc<StyleSheet>>,
    node: Option<Arc<StyleSheet>>,
}

impl MatchedStyleSheet {
    pub fn new(document: Vec<Arc<StyleSheet>>, node: Option<Arc<StyleSheet>>) -> Self {
        Self { document, node }
    }

    pub fn len(&self) -> usize {
        self.document.len() + usize::from(self.node.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowest priority first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<StyleSheet>> {
        self.document.iter().chain(self.node.iter())
    }

    /// Frames for `name`, searched from the highest-priority sheet down.
    pub fn get_keyframes(&self, name: &str) -> PropertyValue {
        self.iter()
            .rev()
            .find_map(|sheet| sheet.keyframes_rule()?.keyframes(name).cloned())
            .map_or(PropertyValue::Undefined, PropertyValue::Value)
    }

    /// Font-face descriptor for `name`; unknown fonts get `{"fontName": name}`.
    pub fn get_font_face(&self, name: &str) -> PropertyValue {
        let face = self
            .iter()
            .rev()
            .find_map(|sheet| sheet.font_face_rule()?.font_face(name).cloned());
        PropertyValue::Value(face.unwrap_or_else(|| default_font_face(name)))
    }
}

fn default_font_face(name: &str) -> Value {
    json!({ "fontName": name })
}
