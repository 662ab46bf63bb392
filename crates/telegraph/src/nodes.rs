//! HTML to Telegraph node conversion
//!
//! `createPage` takes its content as a JSON array of nodes, where a node is
//! either a text string or `{"tag", "attrs", "children"}`. Only `href` and
//! `src` attributes are accepted by Telegraph, so everything else is dropped.
//! Tag filtering is the caller's business.

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

/// Attributes Telegraph keeps on a node.
const KEPT_ATTRIBUTES: &[&str] = &["href", "src"];

/// Convert an HTML fragment into the Telegraph node array.
pub fn html_to_nodes(html: &str) -> Vec<Value> {
    let fragment = Html::parse_fragment(html);
    children_of(fragment.root_element())
}

fn children_of(element: ElementRef<'_>) -> Vec<Value> {
    element
        .children()
        .filter_map(|child| {
            if let Some(child_element) = ElementRef::wrap(child) {
                return Some(element_to_node(child_element));
            }
            let text: &str = child.value().as_text()?;
            if text.is_empty() {
                None
            } else {
                Some(Value::String(text.to_string()))
            }
        })
        .collect()
}

fn element_to_node(element: ElementRef<'_>) -> Value {
    let mut node = Map::new();
    node.insert("tag".into(), Value::String(element.value().name().to_string()));

    let attrs: Map<String, Value> = KEPT_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            element
                .value()
                .attr(name)
                .map(|v| (name.to_string(), Value::String(v.to_string())))
        })
        .collect();
    if !attrs.is_empty() {
        node.insert("attrs".into(), Value::Object(attrs));
    }

    let children = children_of(element);
    if !children.is_empty() {
        node.insert("children".into(), Value::Array(children));
    }
    Value::Object(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_becomes_string_node() {
        assert_eq!(html_to_nodes("hello"), vec![json!("hello")]);
    }

    #[test]
    fn nested_elements_keep_structure() {
        let nodes = html_to_nodes("<p>Hi <b>there</b></p>");
        assert_eq!(
            nodes,
            vec![json!({
                "tag": "p",
                "children": ["Hi ", {"tag": "b", "children": ["there"]}]
            })]
        );
    }

    #[test]
    fn only_href_and_src_survive() {
        let nodes = html_to_nodes(r#"<a href="https://example.com" class="x" target="_blank">link</a>"#);
        assert_eq!(
            nodes,
            vec![json!({
                "tag": "a",
                "attrs": {"href": "https://example.com"},
                "children": ["link"]
            })]
        );
    }

    #[test]
    fn void_elements_have_no_children() {
        let nodes = html_to_nodes(r#"<img src="https://example.com/a.png"><br>"#);
        assert_eq!(
            nodes,
            vec![
                json!({"tag": "img", "attrs": {"src": "https://example.com/a.png"}}),
                json!({"tag": "br"}),
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_nodes() {
        assert!(html_to_nodes("").is_empty());
    }
}
