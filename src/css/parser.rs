//! Style sheet JSON and selector text parsing

use super::declaration::StyleDeclaration;
use super::error::StyleError;
use super::media::MediaList;
use super::rules::{CssRule, FontFaceRule, KeyframesRule, MediaRule, RuleList, StyleRule};
use super::selector::{Selector, SimpleSelector};
use super::stylesheet::StyleSheet;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::sync::Arc;

const KEYFRAMES_KEY: &str = "@KEYFRAMES";
const FONT_FACE_KEY: &str = "@FONT-FACE";
const MEDIA_KEY: &str = "@MEDIA";
const INFO_KEY: &str = "@info";
const MEDIA_CONDITION_KEY: &str = "condition";
const STYLE_OBJECT_ID_KEY: &str = "styleObjectId";

/// Parses a selector list such as `"#a .b > c:hover, .d"`.
///
/// Groups are separated by `,`, child segments by `>`, descendant tokens by whitespace.
/// Never fails; empty fragments are skipped.
pub fn parse_selector_list(text: &str) -> Vec<Selector> {
    text.trim()
        .split(',')
        .filter_map(parse_selector)
        .collect()
}

fn parse_selector(group: &str) -> Option<Selector> {
    let mut selector: Option<Selector> = None;
    for (segment_index, segment) in group.split('>').enumerate() {
        let mut child_pending = segment_index > 0;
        for token in segment.split_whitespace() {
            let Some(simple) = parse_simple_selector(token) else {
                continue;
            };
            selector = Some(match selector {
                None => Selector::Simple(simple),
                Some(prev) if child_pending => Selector::Child {
                    parent: Box::new(prev),
                    child: simple,
                },
                Some(prev) => Selector::Descendant {
                    ancestor: Box::new(prev),
                    child: simple,
                },
            });
            child_pending = false;
        }
    }
    selector
}

fn parse_simple_selector(token: &str) -> Option<SimpleSelector> {
    let mut parts = token.split(':');
    let base = parts.next().filter(|base| !base.is_empty())?;
    let simple = if let Some(id) = base.strip_prefix('#') {
        SimpleSelector::Id(id.to_string())
    } else if let Some(class) = base.strip_prefix('.') {
        SimpleSelector::Class(class.to_string())
    } else {
        SimpleSelector::Element(base.to_string())
    };
    match parts.next().filter(|state| !state.is_empty()) {
        Some(state) => Some(SimpleSelector::State(Box::new(simple), state.to_string())),
        None => Some(simple),
    }
}

/// Owns the rule order counter. Rules parsed later through the same session always have a
/// higher order, so style sheets added later win specificity ties.
#[derive(Debug, Default)]
pub struct ParserSession {
    next_order: u64,
}

impl ParserSession {
    pub fn new() -> Self {
        Self { next_order: 0 }
    }

    pub fn parse_style_sheet_str(&mut self, text: &str) -> Result<StyleSheet, StyleError> {
        let value: Value = serde_json::from_str(text)?;
        self.parse_style_sheet(&value)
    }

    pub fn parse_style_sheet(&mut self, value: &Value) -> Result<StyleSheet, StyleError> {
        let object = value
            .as_object()
            .ok_or_else(|| StyleError::NotAnObject("style sheet".to_string()))?;

        let mut rules = Vec::new();
        let mut style_object_id = None;
        for (key, value) in object {
            match key.as_str() {
                KEYFRAMES_KEY => {
                    let table = lookup_table(key, value)?;
                    rules.push(CssRule::Keyframes(KeyframesRule::new(table)));
                }
                FONT_FACE_KEY => {
                    let table = lookup_table(key, value)?;
                    rules.push(CssRule::FontFace(FontFaceRule::new(table)));
                }
                MEDIA_KEY => self.parse_media_rules(value, &mut rules)?,
                INFO_KEY => {
                    let info = value
                        .as_object()
                        .ok_or_else(|| StyleError::InvalidAtRule(key.clone()))?;
                    style_object_id = info.get(STYLE_OBJECT_ID_KEY).and_then(Value::as_i64);
                }
                _ => {
                    if let Some(rule) = self.parse_style_rule(key, value, false)? {
                        rules.push(CssRule::Style(Arc::new(rule)));
                    }
                }
            }
        }

        debug!(target: "css", "Parsed style sheet with {} rules", rules.len());
        Ok(StyleSheet::new(RuleList::new(rules), style_object_id))
    }

    fn parse_media_rules(&mut self, value: &Value, rules: &mut Vec<CssRule>) -> Result<(), StyleError> {
        let groups = value.as_array().ok_or(StyleError::InvalidMediaList)?;
        for group in groups {
            let group = group.as_object().ok_or(StyleError::InvalidMediaList)?;
            let condition = group
                .get(MEDIA_CONDITION_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default();
            let mut inner = Vec::new();
            for (key, value) in group {
                if key == MEDIA_CONDITION_KEY {
                    continue;
                }
                if let Some(rule) = self.parse_style_rule(key, value, true)? {
                    inner.push(CssRule::Style(Arc::new(rule)));
                }
            }
            rules.push(CssRule::Media(MediaRule::new(
                MediaList::parse(condition),
                RuleList::new(inner),
            )));
        }
        Ok(())
    }

    fn parse_style_rule(
        &mut self,
        key: &str,
        value: &Value,
        in_media: bool,
    ) -> Result<Option<StyleRule>, StyleError> {
        let selector_text = key.trim();
        if selector_text.is_empty() {
            return Ok(None);
        }
        if selector_text.starts_with('@') {
            debug!(target: "css", "Skipping unsupported at-rule {}", selector_text);
            return Ok(None);
        }
        let object = value
            .as_object()
            .ok_or_else(|| StyleError::InvalidDeclaration(selector_text.to_string()))?;
        let selectors = parse_selector_list(selector_text);
        if selectors.is_empty() {
            warn!(target: "css", "No usable selector in '{}'", selector_text);
            return Ok(None);
        }
        let order = self.next_order;
        self.next_order += 1;
        let rule = StyleRule::new(
            selectors,
            StyleDeclaration::from_json(object),
            selector_text.to_string(),
            order,
        );
        Ok(Some(if in_media { rule.within_media() } else { rule }))
    }
}

fn lookup_table(key: &str, value: &Value) -> Result<IndexMap<String, Value>, StyleError> {
    let object = value
        .as_object()
        .ok_or_else(|| StyleError::InvalidAtRule(key.to_string()))?;
    Ok(object
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect())
}

/// Parses an inline style object. Meta keys are skipped like in sheet declarations.
pub fn parse_inline_style(object: &Map<String, Value>) -> StyleDeclaration {
    StyleDeclaration::from_json(object)
}

/// Parses inspector style text: `name: value;` pairs, one or more per line.
///
/// A line wrapped in `/* */` yields disabled properties. Malformed fragments are logged and
/// skipped, so a partially broken edit still applies what it can.
pub fn parse_style_text(text: &str) -> StyleDeclaration {
    let mut declaration = StyleDeclaration::new();
    for line in text.lines() {
        let line = line.trim();
        let (body, disabled) = match line
            .strip_prefix("/*")
            .and_then(|rest| rest.strip_suffix("*/"))
        {
            Some(inner) => (inner, true),
            None => (line, false),
        };
        for fragment in body.split(';') {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            match fragment.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
                    declaration.set_inspector_property(name.trim(), value.trim(), disabled);
                }
                _ => warn!(target: "inspector", "Ignoring malformed style text '{}'", fragment),
            }
        }
    }
    declaration
}
