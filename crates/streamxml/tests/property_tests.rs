//! Property-based tests for XML parsing
//!
//! These tests use proptest to verify:
//! 1. Determinism: two fresh parsers build identical trees from the same bytes
//! 2. Serialized trees parse back to the same names, attributes and text
//! 3. Arbitrary input never panics, and chunking never changes the outcome

use proptest::prelude::*;
use streamxml::{parse_bytes, parse_str, Element, Parser, SliceSource};

#[derive(Clone, Debug)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

/// Escape character data
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Text goes first, then children, matching how text is accumulated
fn serialize(node: &Node) -> String {
    let attrs: String = node
        .attributes
        .iter()
        .map(|(k, v)| format!(" {k}=\"{}\"", escape(v)))
        .collect();
    if node.text.is_empty() && node.children.is_empty() {
        return format!("<{}{attrs}/>", node.name);
    }
    let children: String = node.children.iter().map(serialize).collect();
    format!(
        "<{name}{attrs}>{}{children}</{name}>",
        escape(&node.text),
        name = node.name
    )
}

fn assert_same(node: &Node, element: &Element) -> Result<(), TestCaseError> {
    prop_assert_eq!(element.name(), node.name.as_str());
    prop_assert_eq!(element.text(), node.text.as_str());
    prop_assert_eq!(element.attributes().len(), node.attributes.len());
    for (k, v) in &node.attributes {
        prop_assert_eq!(element.attribute(k), Some(v.as_str()));
    }
    prop_assert_eq!(element.children().len(), node.children.len());
    for (child, parsed) in node.children.iter().zip(element.children()) {
        assert_same(child, parsed)?;
    }
    Ok(())
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_.-]{0,8}"
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-z <>&\"'\u{e9}\u{4e2d}]{0,12}"
}

fn arb_attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(arb_name(), arb_text(), 0..4)
        .prop_map(|map| map.into_iter().collect())
}

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = (arb_name(), arb_attributes(), arb_text()).prop_map(|(name, attributes, text)| {
        Node {
            name,
            attributes,
            text,
            children: Vec::new(),
        }
    });
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            arb_name(),
            arb_attributes(),
            arb_text(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, attributes, text, children)| Node {
                name,
                attributes,
                text,
                children,
            })
    })
}

proptest! {
    #[test]
    fn serialized_tree_parses_back(node in arb_node()) {
        let xml = serialize(&node);
        let doc = parse_str(&xml).map_err(|e| TestCaseError::fail(e.to_string()))?;
        assert_same(&node, doc.root())?;
    }

    #[test]
    fn parsing_is_deterministic(node in arb_node()) {
        let xml = serialize(&node);
        let first = parse_str(&xml);
        let second = parse_str(&xml);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_bytes(&bytes);
    }

    #[test]
    fn chunk_size_does_not_change_result(
        node in arb_node(),
        chunk in 1usize..16,
    ) {
        let xml = serialize(&node);
        let whole = parse_str(&xml);
        let chunked = Parser::new(SliceSource::new(xml.as_bytes()).with_chunk_size(chunk)).parse();
        prop_assert_eq!(whole, chunked);
    }

    #[test]
    fn markup_like_input_never_panics(input in "[<>/!?a-z=\"' &;#\\[\\]-]{0,64}") {
        let _ = parse_str(&input);
    }
}
