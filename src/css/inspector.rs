//! Inspector views over a node's styles, and inspector-driven style edits

use super::declaration::StyleDeclaration;
use super::parser::parse_style_text;
use crate::dom::{Document, NodeId};
use log::{info, warn};
use serde::Serialize;

/// Name of the pseudo rule that carries a node's inline style.
pub const INLINE_RULE_NAME: &str = "INLINE";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorProperty {
    pub name: String,
    pub value: String,
    pub disabled: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorRule {
    pub name: String,
    pub order: u64,
    pub score: u64,
    pub editable: bool,
    pub style: Vec<InspectorProperty>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedStylesForNode {
    pub inline_style: InspectorRule,
    /// Highest priority first.
    pub matched_rules: Vec<InspectorRule>,
}

fn inspector_properties(declaration: &StyleDeclaration) -> Vec<InspectorProperty> {
    declaration
        .properties()
        .map(|property| InspectorProperty {
            name: property.inspector_name(),
            value: property.value_text(),
            disabled: property.disabled(),
        })
        .collect()
}

/// Inline style plus the rules of the node's last cascade.
pub fn matched_styles_for_node(doc: &Document, id: NodeId) -> Option<MatchedStylesForNode> {
    let node = doc.node(id)?;
    let inline_style = InspectorRule {
        name: INLINE_RULE_NAME.to_string(),
        order: 0,
        score: 0,
        editable: true,
        style: inspector_properties(node.inline_style()),
    };
    let matched_rules = node
        .matched_rules()
        .map(|matched| {
            matched
                .descending()
                .map(|entry| {
                    let rule = entry.rule();
                    InspectorRule {
                        name: rule.selector_text().to_string(),
                        order: rule.order(),
                        score: entry.score(),
                        editable: rule.editable() && entry.pseudo_key().is_none(),
                        style: inspector_properties(rule.declaration()),
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    Some(MatchedStylesForNode {
        inline_style,
        matched_rules,
    })
}

/// Defined final-style properties of the node.
pub fn computed_style_for_node(doc: &Document, id: NodeId) -> Vec<InspectorProperty> {
    doc.node(id)
        .map(|node| {
            node.final_style()
                .properties()
                .filter(|property| !property.value().is_undefined())
                .map(|property| InspectorProperty {
                    name: property.inspector_name(),
                    value: property.value_text(),
                    disabled: property.disabled(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Replaces the inline style of `id` with the properties in `text`.
pub fn set_style_texts(doc: &mut Document, id: NodeId, text: &str) -> bool {
    if !doc.contains(id) {
        warn!(target: "inspector", "setStyleTexts on missing node {}", id);
        return false;
    }
    let declaration = parse_style_text(text);
    info!(target: "inspector", "Node {} inline style replaced with {} properties", id, declaration.len());
    doc.replace_inline_styles(id, declaration);
    true
}

/// Sets a single `name: value` property in the inline style of `id`.
pub fn set_property_text(doc: &mut Document, id: NodeId, text: &str) -> bool {
    if !doc.contains(id) {
        warn!(target: "inspector", "setPropertyText on missing node {}", id);
        return false;
    }
    let declaration = parse_style_text(text);
    if declaration.is_empty() {
        return false;
    }
    doc.update_inline_styles(id, &declaration);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::ParserSession;
    use serde_json::json;
    use std::sync::Arc;

    fn styled_doc() -> (Document, NodeId) {
        let sheet = ParserSession::new()
            .parse_style_sheet(&json!({
                "text": {"fontSize": "10px"},
                ".title": {"color": "red", "backgroundColor": "blue"}
            }))
            .expect("sheet");
        let mut doc = Document::new();
        doc.add_style_sheet(Arc::new(sheet));
        let text = doc.create_node("text");
        doc.set_css_class(text, "title");
        doc.append_child(doc.root(), text);
        doc.restyle_dirty();
        (doc, text)
    }

    #[test]
    fn matched_rules_descending() {
        let (doc, text) = styled_doc();
        let styles = matched_styles_for_node(&doc, text).expect("node exists");
        let names: Vec<_> = styles.matched_rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![".title", "text"]);
        assert_eq!(styles.matched_rules[0].style[1].name, "background-color");
        assert_eq!(styles.inline_style.name, INLINE_RULE_NAME);
    }

    #[test]
    fn style_text_edits_restyle() {
        let (mut doc, text) = styled_doc();
        assert!(set_style_texts(&mut doc, text, "color: green;\n/* font-size: 30px; */"));
        let computed = computed_style_for_node(&doc, text);
        let color = computed.iter().find(|p| p.name == "color").map(|p| p.value.as_str());
        assert_eq!(color, Some("green"));
        let size = computed.iter().find(|p| p.name == "font-size").map(|p| p.value.as_str());
        assert_eq!(size, Some("10px"));

        assert!(set_property_text(&mut doc, text, "margin-top: 4px"));
        let computed = computed_style_for_node(&doc, text);
        assert!(computed.iter().any(|p| p.name == "margin-top" && p.value == "4px"));
        assert!(computed.iter().any(|p| p.name == "color" && p.value == "green"));
        assert!(!set_property_text(&mut doc, text, "garbage"));
    }

    #[test]
    fn serializes_camel_case() {
        let (doc, text) = styled_doc();
        let styles = matched_styles_for_node(&doc, text).expect("node exists");
        let value = serde_json::to_value(&styles).expect("serializable");
        assert!(value.get("inlineStyle").is_some());
        assert_eq!(value["matchedRules"][0]["name"], json!(".title"));
    }
}
