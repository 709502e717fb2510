pub mod css;
pub mod dom;
pub mod logger;
pub mod sandbox;

use css::inspector::matched_styles_for_node;
use css::{MediaEnvironment, ParserSession, StyleError, StyleSheet};
use dom::{Document, NodeId};
use log::{LevelFilter, debug, info};
use serde_json::{Map, Value, json};
use std::str::FromStr;
use std::sync::Arc;

const LOG_ENV: &str = "QUICKSTYLE_LOG";
const DEBUG_ENV: &str = "QUICKSTYLE_DEBUG";

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Include matched rules next to computed styles in dumps.
    pub debug: bool,
    pub log_level: LevelFilter,
    pub media: MediaEnvironment,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: LevelFilter::Info,
            media: MediaEnvironment::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `QUICKSTYLE_LOG` (a level name) and `QUICKSTYLE_DEBUG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(level) = std::env::var(LOG_ENV)
            .ok()
            .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        {
            config.log_level = level;
        }
        config.debug = std::env::var(DEBUG_ENV).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        config
    }
}

/// A document together with the parser session that feeds it style sheets.
pub struct StyleEngine {
    config: EngineConfig,
    session: ParserSession,
    document: Document,
}

impl StyleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let document = Document::with_media(config.media.clone());
        Self {
            config,
            session: ParserSession::new(),
            document,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Parses a sheet without attaching it anywhere, e.g. for a node-level sheet.
    pub fn parse_style_sheet(&mut self, value: &Value) -> Result<Arc<StyleSheet>, StyleError> {
        Ok(Arc::new(self.session.parse_style_sheet(value)?))
    }

    /// Parses a sheet from JSON text and adds it at document level.
    pub fn load_style_sheet(&mut self, text: &str) -> Result<Arc<StyleSheet>, StyleError> {
        let sheet = Arc::new(self.session.parse_style_sheet_str(text)?);
        self.document.add_style_sheet(Arc::clone(&sheet));
        info!(target: "css", "Loaded document style sheet ({} rules)", sheet.rules().len());
        Ok(sheet)
    }

    /// Builds nodes from `{"tag", "id", "class", "style", "styleSheet", "children"}`
    /// objects under `parent`.
    pub fn build_tree(&mut self, parent: NodeId, value: &Value) -> Result<NodeId, StyleError> {
        let object = value
            .as_object()
            .ok_or_else(|| StyleError::NotAnObject("node".to_string()))?;
        let tag = object.get("tag").and_then(Value::as_str).unwrap_or("div");
        let node = self.document.create_node(tag);
        self.document.append_child(parent, node);
        if let Some(id) = object.get("id").and_then(Value::as_str) {
            self.document.set_css_id(node, id);
        }
        if let Some(class) = object.get("class").and_then(Value::as_str) {
            self.document.set_css_class(node, class);
        }
        if let Some(sheet) = object.get("styleSheet") {
            let sheet = self.parse_style_sheet(sheet)?;
            self.document.set_style_sheet(node, Some(sheet));
        }
        if let Some(style) = object.get("style") {
            let style = style
                .as_object()
                .ok_or_else(|| StyleError::NotAnObject("inline style".to_string()))?;
            self.document.set_inline_style(node, style);
        }
        if let Some(children) = object.get("children").and_then(Value::as_array) {
            for child in children {
                self.build_tree(node, child)?;
            }
        }
        Ok(node)
    }

    /// Restyles every dirty node.
    pub fn restyle(&mut self) -> usize {
        self.document.restyle_dirty()
    }

    /// The document's computed styles as a JSON tree.
    pub fn computed_styles(&self) -> Value {
        let root = self.document.root();
        let children: Vec<Value> = self
            .document
            .node(root)
            .map(|n| n.children().iter().map(|&c| self.dump_node(c)).collect())
            .unwrap_or_default();
        Value::Array(children)
    }

    fn dump_node(&self, id: NodeId) -> Value {
        let Some(node) = self.document.node(id) else {
            return Value::Null;
        };
        let style: Map<String, Value> = node.final_style().to_style_map().into_iter().collect();
        let mut out = json!({
            "tag": node.tag_name(),
            "style": style,
        });
        if let Some(id) = node.css_id() {
            out["id"] = json!(id);
        }
        if !node.css_class().is_empty() {
            out["class"] = json!(node.css_class().join(" "));
        }
        if self.config.debug {
            if let Some(matched) = matched_styles_for_node(&self.document, id) {
                out["matched"] = serde_json::to_value(matched).unwrap_or(Value::Null);
            }
        }
        let children: Vec<Value> = node.children().iter().map(|&c| self.dump_node(c)).collect();
        if !children.is_empty() {
            out["children"] = Value::Array(children);
        }
        debug!(target: "css", "Dumped node {}", id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_dumps_tree() {
        let mut engine = StyleEngine::new(EngineConfig::default());
        engine
            .load_style_sheet(r##"{".title": {"color": "red"}, "#main text": {"fontSize": "20px"}}"##)
            .expect("sheet");
        let tree = json!({
            "tag": "div",
            "id": "main",
            "children": [
                {"tag": "text", "class": "title", "style": {"width": "10px"}}
            ]
        });
        let root = engine.document().root();
        engine.build_tree(root, &tree).expect("tree");
        assert!(engine.restyle() >= 2);

        let dump = engine.computed_styles();
        let text = &dump[0]["children"][0];
        assert_eq!(text["style"]["color"], json!("red"));
        assert_eq!(text["style"]["fontSize"], json!("20px"));
        assert_eq!(text["style"]["width"], json!("10px"));
        assert_eq!(dump[0]["id"], json!("main"));
    }

    #[test]
    fn rejects_non_object_nodes() {
        let mut engine = StyleEngine::new(EngineConfig::default());
        let root = engine.document().root();
        assert!(matches!(
            engine.build_tree(root, &json!("text")),
            Err(StyleError::NotAnObject(_))
        ));
    }
}
