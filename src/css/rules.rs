//! CSS rule types and structures

use super::declaration::StyleDeclaration;
use super::media::MediaList;
use super::selector::Selector;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// A selector list bound to a declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleRule {
    selectors: Vec<Selector>,
    declaration: StyleDeclaration,
    selector_text: String,
    order: u64,
    in_media: bool,
    editable: bool,
}

impl StyleRule {
    pub fn new(
        selectors: Vec<Selector>,
        declaration: StyleDeclaration,
        selector_text: String,
        order: u64,
    ) -> Self {
        Self {
            selectors,
            declaration,
            selector_text,
            order,
            in_media: false,
            editable: true,
        }
    }

    /// Marks the rule as declared inside an `@MEDIA` group.
    pub fn within_media(mut self) -> Self {
        self.in_media = true;
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn declaration(&self) -> &StyleDeclaration {
        &self.declaration
    }

    pub fn selector_text(&self) -> &str {
        &self.selector_text
    }

    /// Tie-break between rules of equal specificity; later rules win.
    pub fn order(&self) -> u64 {
        self.order
    }

    /// Rules inside `@MEDIA` outrank plain rules of equal specificity.
    pub fn in_media(&self) -> bool {
        self.in_media
    }

    pub fn editable(&self) -> bool {
        self.editable
    }
}

/// `@KEYFRAMES`: animation name -> array of frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyframesRule {
    animations: IndexMap<String, Value>,
}

impl KeyframesRule {
    pub fn new(animations: IndexMap<String, Value>) -> Self {
        Self { animations }
    }

    pub fn keyframes(&self, name: &str) -> Option<&Value> {
        self.animations.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.animations.keys()
    }
}

/// `@FONT-FACE`: font name -> face descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontFaceRule {
    faces: IndexMap<String, Value>,
}

impl FontFaceRule {
    pub fn new(faces: IndexMap<String, Value>) -> Self {
        Self { faces }
    }

    pub fn font_face(&self, name: &str) -> Option<&Value> {
        self.faces.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.faces.keys()
    }
}

/// A conditional group of rules, active while its media list evaluates true.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRule {
    media: MediaList,
    rules: RuleList,
}

impl MediaRule {
    pub fn new(media: MediaList, rules: RuleList) -> Self {
        Self { media, rules }
    }

    pub fn media(&self) -> &MediaList {
        &self.media
    }

    pub fn rules(&self) -> &RuleList {
        &self.rules
    }
}

/// CSS rule types
#[derive(Clone, Debug, PartialEq)]
pub enum CssRule {
    Style(Arc<StyleRule>),
    FontFace(FontFaceRule),
    Keyframes(KeyframesRule),
    Media(MediaRule),
}

/// Immutable, ordered sequence of rules.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleList {
    rules: Vec<CssRule>,
}

impl RuleList {
    pub fn new(rules: Vec<CssRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&CssRule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CssRule> {
        self.rules.iter()
    }

    /// Get all style rules (filtering out at-rules)
    pub fn style_rules(&self) -> impl Iterator<Item = &Arc<StyleRule>> {
        self.rules.iter().filter_map(|rule| match rule {
            CssRule::Style(style) => Some(style),
            _ => None,
        })
    }

    /// Get media rules specifically
    pub fn media_rules(&self) -> impl Iterator<Item = &MediaRule> {
        self.rules.iter().filter_map(|rule| match rule {
            CssRule::Media(media) => Some(media),
            _ => None,
        })
    }

    pub fn keyframes_rule(&self) -> Option<&KeyframesRule> {
        self.rules.iter().rev().find_map(|rule| match rule {
            CssRule::Keyframes(keyframes) => Some(keyframes),
            _ => None,
        })
    }

    pub fn font_face_rule(&self) -> Option<&FontFaceRule> {
        self.rules.iter().rev().find_map(|rule| match rule {
            CssRule::FontFace(font_face) => Some(font_face),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a RuleList {
    type Item = &'a CssRule;
    type IntoIter = std::slice::Iter<'a, CssRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
