//! Cascade resolution: which rules apply to a node, and the style they produce

use super::declaration::StyleDeclaration;
use super::matched::{MatchedRule, MatchedRuleList};
use super::matching::{MatchContext, MatchEffects, MatchMode};
use super::property::{PSEUDO_STATE, PropertyBuilder, PropertyValue};
use super::rules::{CssRule, StyleRule};
use super::stylesheet::MatchedStyleSheet;
use crate::dom::{Document, NodeId};
use log::trace;
use serde_json::{Value, json};
use std::sync::Arc;

pub const ANIMATION_NAME: &str = "animationName";
pub const ANIMATION_KEYFRAMES: &str = "animationKeyframes";
pub const PAGE_ANIMATION_NAME: &str = "pageAnimationName";
pub const PAGE_ANIMATION_KEYFRAMES: &str = "pageAnimationKeyframes";
pub const FONT_FAMILY: &str = "fontFamily";
pub const FONT_FAMILY_DESC: &str = "fontFamilyDesc";

#[derive(Clone, Copy)]
enum Lookup {
    Keyframes,
    FontFace,
}

const DERIVED_PROPERTIES: [(&str, &str, Lookup); 3] = [
    (ANIMATION_NAME, ANIMATION_KEYFRAMES, Lookup::Keyframes),
    (PAGE_ANIMATION_NAME, PAGE_ANIMATION_KEYFRAMES, Lookup::Keyframes),
    (FONT_FAMILY, FONT_FAMILY_DESC, Lookup::FontFace),
];

/// Collects every rule matching `node`, ascending by priority.
///
/// The walk only reads the document; dirty marks and listener registrations are returned
/// for the caller to apply.
pub(crate) fn collect_matched_rules(doc: &Document, node: NodeId) -> (MatchedRuleList, MatchEffects) {
    let sheets = doc.matched_style_sheet(node);
    let mut ctx = MatchContext::new(doc, MatchMode::Cascade, node);
    let mut matched = Vec::new();

    for sheet in sheets.iter() {
        for rule in sheet.rules() {
            match rule {
                CssRule::Style(rule) => match_rule(&mut ctx, rule, &mut matched),
                CssRule::Media(media) => {
                    if media.media().evaluate(doc.media_environment()) {
                        for rule in media.rules().style_rules() {
                            match_rule(&mut ctx, rule, &mut matched);
                        }
                    }
                }
                CssRule::FontFace(_) | CssRule::Keyframes(_) => {}
            }
        }
    }

    trace!(target: "css", "{} rules matched node {}", matched.len(), node);
    (MatchedRuleList::new(matched), ctx.into_effects())
}

fn match_rule(ctx: &mut MatchContext<'_>, rule: &Arc<StyleRule>, out: &mut Vec<MatchedRule>) {
    ctx.set_rule(rule);
    let mut normal: Option<u64> = None;
    let mut pseudo: Option<(u64, String)> = None;
    for selector in rule.selectors() {
        if !ctx.matches_leaf(selector) {
            continue;
        }
        let specificity = selector.specificity();
        if ctx.matched_pseudo() {
            if pseudo.as_ref().is_none_or(|(best, _)| specificity > *best) {
                pseudo = Some((specificity, selector.to_string()));
            }
        } else {
            normal = Some(normal.map_or(specificity, |best| best.max(specificity)));
        }
    }

    if let Some(specificity) = normal {
        out.push(MatchedRule::new(Arc::clone(rule), specificity, None));
    } else if let Some((specificity, key)) = pseudo {
        out.push(MatchedRule::new(Arc::clone(rule), specificity, Some(key)));
    }
}

/// Recomputes `final_style` from the matched rules and the inline style.
///
/// Every previous value is first reset to `Undefined`, so properties no longer contributed
/// by any rule are explicitly cleared.
pub fn merge_final_style(
    final_style: &mut StyleDeclaration,
    matched: &MatchedRuleList,
    inline: &StyleDeclaration,
    sheets: &MatchedStyleSheet,
) {
    final_style.reset_to_undefined();

    for entry in matched {
        for property in entry.rule().declaration().properties() {
            if property.disabled() {
                continue;
            }
            match entry.pseudo_key() {
                Some(key) if !property.is_pseudo() => {
                    let state = format!("{}+{}", PSEUDO_STATE, key);
                    final_style.set_property(
                        PropertyBuilder::from_property(property)
                            .state(Some(state.as_str()))
                            .build(),
                    );
                }
                _ => final_style.set_property(property.clone()),
            }
        }
    }

    for property in inline.properties().filter(|p| !p.disabled()) {
        final_style.set_property(property.clone());
    }

    expand_derived_properties(final_style, sheets);
}

/// Adds `animationKeyframes`, `pageAnimationKeyframes` and `fontFamilyDesc` next to their
/// source properties, keeping the source's state.
pub fn expand_derived_properties(declaration: &mut StyleDeclaration, sheets: &MatchedStyleSheet) {
    for (source, target, lookup) in DERIVED_PROPERTIES {
        let sources: Vec<_> = declaration
            .properties()
            .filter(|p| p.name_without_state() == source)
            .cloned()
            .collect();
        for property in sources {
            let value = match property.value() {
                PropertyValue::Undefined => PropertyValue::Undefined,
                PropertyValue::Value(Value::String(names)) => resolve_names(names, lookup, sheets),
                PropertyValue::Value(_) => continue,
            };
            declaration.set_property(
                PropertyBuilder::from_property(&property)
                    .name_without_state(target)
                    .value(value)
                    .build(),
            );
        }
    }
}

fn resolve_names(names: &str, lookup: Lookup, sheets: &MatchedStyleSheet) -> PropertyValue {
    let mut resolved = Vec::new();
    for name in dequote(names).split(',').map(dequote).filter(|n| !n.is_empty()) {
        match lookup {
            Lookup::Keyframes => {
                if let PropertyValue::Value(Value::Array(frames)) = sheets.get_keyframes(name) {
                    resolved.extend(frames);
                    resolved.push(json!({ ANIMATION_NAME: name }));
                }
            }
            Lookup::FontFace => {
                if let PropertyValue::Value(face) = sheets.get_font_face(name) {
                    resolved.push(face);
                }
            }
        }
    }
    PropertyValue::Value(Value::Array(resolved))
}

fn dequote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::ParserSession;
    use crate::css::property::Property;

    fn sheets(json: Value) -> MatchedStyleSheet {
        let sheet = ParserSession::new()
            .parse_style_sheet(&json)
            .expect("valid sheet");
        MatchedStyleSheet::new(vec![Arc::new(sheet)], None)
    }

    #[test]
    fn dequotes_names() {
        assert_eq!(dequote(" 'my font' "), "my font");
        assert_eq!(dequote("\"a\""), "a");
        assert_eq!(dequote("plain"), "plain");
    }

    #[test]
    fn keyframes_are_expanded_with_sentinel() {
        let sheets = sheets(json!({
            "@KEYFRAMES": {
                "fade": [{"opacity": 0}, {"opacity": 1}],
                "spin": [{"transform": "rotate(0)"}]
            }
        }));
        let mut declaration = StyleDeclaration::new();
        declaration.set_property(Property::new(ANIMATION_NAME, json!("\"fade, missing, spin\"")));
        expand_derived_properties(&mut declaration, &sheets);
        let frames = declaration
            .property_value(ANIMATION_KEYFRAMES)
            .and_then(PropertyValue::as_value)
            .cloned();
        assert_eq!(
            frames,
            Some(json!([
                {"opacity": 0},
                {"opacity": 1},
                {"animationName": "fade"},
                {"transform": "rotate(0)"},
                {"animationName": "spin"}
            ]))
        );
    }

    #[test]
    fn undefined_source_clears_derived() {
        let mut declaration = StyleDeclaration::new();
        declaration.set_property(Property::new(FONT_FAMILY, PropertyValue::Undefined));
        declaration.set_property(Property::new("fontFamily:active", json!("serif")));
        expand_derived_properties(&mut declaration, &MatchedStyleSheet::default());
        assert!(
            declaration
                .property_value(FONT_FAMILY_DESC)
                .is_some_and(PropertyValue::is_undefined)
        );
        assert_eq!(
            declaration
                .property_value("fontFamilyDesc:active")
                .and_then(PropertyValue::as_value),
            Some(&json!([{"fontName": "serif"}]))
        );
    }
}
