//! End-to-end cascade scenarios
//!
//! Each case builds a small document from style sheet JSON, restyles it and checks the
//! final styles (or what the bound components received).

use super::declaration::StyleDeclaration;
use super::parser::ParserSession;
use super::property::PropertyValue;
use crate::dom::component::Component;
use crate::dom::{Document, NodeId};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Apply(String, IndexMap<String, Value>),
    Restore,
}

/// Component double that records what the engine pushes to it.
struct RecordingComponent {
    states: Arc<Mutex<HashMap<String, bool>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Component for RecordingComponent {
    fn state_map(&self) -> HashMap<String, bool> {
        self.states.lock().clone()
    }

    fn apply_pseudo_styles(&mut self, key: &str, style: &StyleDeclaration) {
        self.events
            .lock()
            .push(Event::Apply(key.to_string(), style.to_style_map()));
    }

    fn restore_styles(&mut self) {
        self.events.lock().push(Event::Restore);
    }
}

struct Handles {
    states: Arc<Mutex<HashMap<String, bool>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

fn bind_recorder(doc: &mut Document, node: NodeId) -> Handles {
    let states = Arc::new(Mutex::new(HashMap::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    doc.bind_component(
        node,
        Box::new(RecordingComponent {
            states: Arc::clone(&states),
            events: Arc::clone(&events),
        }),
    );
    Handles { states, events }
}

fn document_with(sheet: Value) -> Document {
    let mut session = ParserSession::new();
    let sheet = session.parse_style_sheet(&sheet).expect("valid style sheet");
    let mut doc = Document::new();
    doc.add_style_sheet(Arc::new(sheet));
    doc
}

fn element(doc: &mut Document, parent: NodeId, tag: &str, id: &str, class: &str) -> NodeId {
    let node = doc.create_node(tag);
    doc.set_css_id(node, id);
    doc.set_css_class(node, class);
    doc.append_child(parent, node);
    node
}

fn value<'a>(doc: &'a Document, node: NodeId, key: &str) -> Option<&'a PropertyValue> {
    doc.node(node)?.final_style().property_value(key)
}

fn text<'a>(doc: &'a Document, node: NodeId, key: &str) -> Option<&'a str> {
    value(doc, node, key).and_then(PropertyValue::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_beats_classes_regardless_of_order() {
        let mut doc = document_with(json!({
            "#hero": {"color": "red"},
            ".a .b .c": {"color": "blue"}
        }));
        let root = doc.root();
        let a = element(&mut doc, root, "div", "", "a");
        let b = element(&mut doc, a, "div", "", "b");
        let c = element(&mut doc, b, "text", "hero", "c");
        doc.restyle_dirty();
        assert_eq!(text(&doc, c, "color"), Some("red"));
    }

    #[test]
    fn later_rule_wins_at_equal_specificity() {
        let mut doc = document_with(json!({
            ".class-test1": {"color": "red"},
            ".class-test2": {"color": "blue"}
        }));
        let root = doc.root();
        let node = element(&mut doc, root, "text", "", "class-test2 class-test1");
        doc.restyle_dirty();
        assert_eq!(text(&doc, node, "color"), Some("blue"));
    }

    #[test]
    fn final_style_is_idempotent() {
        let mut doc = document_with(json!({
            "text": {"fontSize": "12px"},
            ".doc-page #idTest1": {"color": "red", "animationName": "none"}
        }));
        let root = doc.root();
        let page = element(&mut doc, root, "div", "", "doc-page");
        let node = element(&mut doc, page, "text", "idTest1", "");
        doc.restyle_dirty();

        let matched = doc.cal_matched_styles(node);
        let first = doc.cal_final_style(node, &matched).cloned();
        let second = doc.cal_final_style(node, &matched).cloned();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn media_rule_beats_equal_plain_rule() {
        let sheet = json!({
            "@MEDIA": [{"condition": "screen and (min-width: 300)", ".box": {"width": "200px"}}],
            ".box": {"width": "100px"}
        });
        let mut doc = document_with(sheet);
        let root = doc.root();
        let node = element(&mut doc, root, "div", "", "box");
        doc.restyle_dirty();
        assert_eq!(text(&doc, node, "width"), Some("200px"));

        let mut narrow = doc.media_environment().clone();
        narrow.viewport_width = 200;
        doc.set_media_environment(narrow);
        doc.restyle_dirty();
        assert_eq!(text(&doc, node, "width"), Some("100px"));
    }

    #[test]
    fn inline_style_wins() {
        let mut doc = document_with(json!({"#box": {"width": "10px", "height": "5px"}}));
        let root = doc.root();
        let node = element(&mut doc, root, "div", "box", "");
        let inline = json!({"width": "99px"});
        doc.set_inline_style(node, inline.as_object().expect("object"));
        doc.restyle_dirty();
        assert_eq!(text(&doc, node, "width"), Some("99px"));
        assert_eq!(text(&doc, node, "height"), Some("5px"));
    }

    #[test]
    fn dropped_properties_become_undefined() {
        let mut doc = document_with(json!({".on": {"color": "red"}}));
        let root = doc.root();
        let node = element(&mut doc, root, "text", "", "on");
        doc.restyle_dirty();
        assert_eq!(text(&doc, node, "color"), Some("red"));

        doc.set_css_class(node, "");
        doc.restyle_dirty();
        assert!(value(&doc, node, "color").is_some_and(PropertyValue::is_undefined));
    }

    #[test]
    fn pseudo_state_pushes_styles_to_leaf() {
        let mut doc = document_with(json!({
            ".label": {"color": "black"},
            ".btn:active .label": {"color": "red"}
        }));
        let root = doc.root();
        let btn = element(&mut doc, root, "div", "", "btn");
        let label = element(&mut doc, btn, "text", "", "label");
        let other = element(&mut doc, root, "text", "", "label");
        let btn_handles = bind_recorder(&mut doc, btn);
        let label_handles = bind_recorder(&mut doc, label);
        doc.restyle_dirty();

        assert_eq!(text(&doc, label, "color"), Some("black"));
        assert_eq!(
            text(&doc, label, "color:pseudo+.btn:active .label"),
            Some("red")
        );
        let label_before = doc.node(label).map(|n| n.final_style().clone());
        let other_before = doc.node(other).map(|n| n.final_style().clone());

        btn_handles.states.lock().insert("active".to_string(), true);
        let active = HashMap::from([("active".to_string(), true)]);
        doc.handle_state_changed(btn, &active);

        let mut expected = IndexMap::new();
        expected.insert("color".to_string(), json!("red"));
        assert_eq!(
            label_handles.events.lock().as_slice(),
            [Event::Apply(".btn:active .label".to_string(), expected)]
        );

        let inactive = HashMap::from([("active".to_string(), false)]);
        doc.handle_state_changed(btn, &inactive);
        assert_eq!(label_handles.events.lock().last(), Some(&Event::Restore));

        assert!(btn_handles.events.lock().is_empty());
        assert!(!doc.is_dirty(label) && !doc.is_dirty(other));
        assert_eq!(doc.node(label).map(|n| n.final_style().clone()), label_before);
        assert_eq!(doc.node(other).map(|n| n.final_style().clone()), other_before);
    }

    #[test]
    fn state_change_set_keeps_earlier_states() {
        let mut doc = document_with(json!({".btn:active .label": {"color": "red"}}));
        let root = doc.root();
        let btn = element(&mut doc, root, "div", "", "btn");
        let label = element(&mut doc, btn, "text", "", "label");
        let btn_handles = bind_recorder(&mut doc, btn);
        let label_handles = bind_recorder(&mut doc, label);
        doc.restyle_dirty();

        btn_handles.states.lock().insert("active".to_string(), true);
        doc.handle_state_changed(btn, &HashMap::from([("active".to_string(), true)]));
        btn_handles.states.lock().insert("focus".to_string(), true);
        doc.handle_state_changed(btn, &HashMap::from([("focus".to_string(), true)]));

        {
            let events = label_handles.events.lock();
            assert_eq!(events.len(), 2);
            assert!(!events.contains(&Event::Restore));
        }

        btn_handles.states.lock().insert("active".to_string(), false);
        doc.handle_state_changed(btn, &HashMap::from([("active".to_string(), false)]));
        assert_eq!(label_handles.events.lock().last(), Some(&Event::Restore));
    }

    #[test]
    fn pseudo_styles_wait_for_binding() {
        let mut doc = document_with(json!({".btn:active > .icon": {"opacity": 0.5}}));
        let root = doc.root();
        let btn = element(&mut doc, root, "div", "", "btn");
        let icon = element(&mut doc, btn, "image", "", "icon");
        doc.restyle_dirty();

        let active = HashMap::from([("active".to_string(), true)]);
        doc.handle_state_changed(btn, &active);
        assert!(doc.node(icon).is_some_and(|n| !n.pending_style().is_none()));

        let handles = bind_recorder(&mut doc, icon);
        let events = handles.events.lock();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Apply(key, style)
            if key == ".btn:active > .icon" && style.get("opacity") == Some(&json!(0.5))));
    }

    #[test]
    fn font_faces_resolve_each_name() {
        let mut doc = document_with(json!({
            "@FONT-FACE": {"myfont": {"fontName": "myfont", "fontSrc": ["/common/myfont.ttf"]}},
            "text": {"fontFamily": "myfont, unknown"}
        }));
        let root = doc.root();
        let node = element(&mut doc, root, "text", "", "");
        doc.restyle_dirty();
        assert_eq!(
            value(&doc, node, "fontFamilyDesc").and_then(PropertyValue::as_value),
            Some(&json!([
                {"fontName": "myfont", "fontSrc": ["/common/myfont.ttf"]},
                {"fontName": "unknown"}
            ]))
        );
    }

    #[test]
    fn unknown_keyframes_contribute_nothing() {
        let mut doc = document_with(json!({
            "@KEYFRAMES": {"fade": [{"opacity": 0}, {"opacity": 1}]},
            ".anim": {"animationName": "ghost"}
        }));
        let root = doc.root();
        let node = element(&mut doc, root, "div", "", "anim");
        doc.restyle_dirty();
        assert_eq!(
            value(&doc, node, "animationKeyframes").and_then(PropertyValue::as_value),
            Some(&json!([]))
        );
    }

    #[test]
    fn node_sheet_parsed_later_wins() {
        let mut session = ParserSession::new();
        let doc_sheet = session
            .parse_style_sheet(&json!({"text": {"color": "red"}}))
            .expect("doc sheet");
        let page_sheet = session
            .parse_style_sheet(&json!({"text": {"color": "green"}}))
            .expect("page sheet");
        let mut doc = Document::new();
        doc.add_style_sheet(Arc::new(doc_sheet));
        let root = doc.root();
        let page = element(&mut doc, root, "div", "", "");
        doc.set_style_sheet(page, Some(Arc::new(page_sheet)));
        let node = element(&mut doc, page, "text", "", "");
        doc.restyle_dirty();
        assert_eq!(text(&doc, node, "color"), Some("green"));
    }

    #[test]
    fn reappended_child_is_styled_once() {
        let mut doc = document_with(json!({"div > text": {"color": "red"}}));
        let root = doc.root();
        let parent = element(&mut doc, root, "div", "", "");
        let child = element(&mut doc, parent, "text", "", "");
        doc.append_child(parent, child);
        doc.restyle_dirty();
        assert_eq!(doc.node(parent).map(|n| n.children().len()), Some(1));
        assert_eq!(text(&doc, child, "color"), Some("red"));
    }

    #[test]
    fn removed_child_appended_twice_has_one_entry() {
        let mut doc = document_with(json!({"div > text": {"color": "red"}}));
        let root = doc.root();
        let parent = element(&mut doc, root, "div", "", "");
        let child = element(&mut doc, parent, "text", "", "");
        doc.restyle_dirty();

        assert!(doc.remove_child(parent, child));
        assert_eq!(doc.parent(child), None);
        doc.append_child(parent, child);
        doc.append_child(parent, child);
        assert!(doc.is_dirty(child));
        doc.restyle_dirty();

        assert_eq!(doc.node(parent).map(|n| n.children()), Some(&[child][..]));
        assert_eq!(doc.parent(child), Some(parent));
        assert_eq!(text(&doc, child, "color"), Some("red"));
    }

    #[test]
    fn detached_node_retries_after_attach() {
        let mut doc = document_with(json!({".app .page text": {"color": "red"}}));
        let page = doc.create_node("div");
        doc.set_css_class(page, "page");
        let child = doc.create_node("text");
        doc.append_child(page, child);
        doc.restyle(child);
        assert!(doc.is_dirty(child));
        assert_eq!(text(&doc, child, "color"), None);

        let root = doc.root();
        let app = element(&mut doc, root, "div", "", "app");
        doc.append_child(app, page);
        doc.restyle_dirty();
        assert_eq!(text(&doc, child, "color"), Some("red"));
        assert!(!doc.is_dirty(child));
    }
}
