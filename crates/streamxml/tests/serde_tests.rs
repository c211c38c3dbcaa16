#![cfg(feature = "serde")]
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use serde_json::{json, Value};
use streamxml::{parse_bytes_with_config, parse_str, AttributePolicy, Config};

fn to_value(doc: &streamxml::Document) -> Value {
    serde_json::to_value(doc).unwrap()
}

#[test]
fn test_document_shape() {
    let doc = parse_str("<?xml version=\"1.0\"?><!DOCTYPE a><a y=\"2\" x=\"1\">t<b/></a>").unwrap();
    let value = to_value(&doc);

    assert_eq!(value["declaration"]["name"], json!("xml"));
    assert_eq!(value["declaration"]["attributes"], json!({ "version": "1.0" }));
    assert_eq!(value["doctype"], json!(["a"]));

    let root = &value["root"];
    assert_eq!(root["name"], json!("a"));
    assert_eq!(root["text"], json!("t"));
    assert_eq!(root["closed_explicitly"], json!(true));
    assert_eq!(root["pos"], json!({ "offset": 33, "line": 1, "col": 34 }));
    assert_eq!(
        root["children"],
        json!([{
            "name": "b",
            "attributes": {},
            "text": "",
            "children": [],
            "pos": { "offset": 49, "line": 1, "col": 50 },
            "closed_explicitly": false
        }])
    );
}

#[test]
fn test_sorted_attributes_are_an_object() {
    let doc = parse_str("<a y=\"2\" x=\"1\"/>").unwrap();
    let value = to_value(&doc);
    assert_eq!(value["root"]["attributes"], json!({ "x": "1", "y": "2" }));
    assert_eq!(
        serde_json::to_string(&value["root"]["attributes"]).unwrap(),
        r#"{"x":"1","y":"2"}"#
    );
}

#[test]
fn test_unsorted_attributes_are_pairs() {
    let config = Config::default().with_attribute_policy(AttributePolicy::Unsorted);
    let doc = parse_bytes_with_config(b"<a b=\"1\" a=\"2\" b=\"3\"/>", config).unwrap();
    let value = to_value(&doc);
    assert_eq!(
        value["root"]["attributes"],
        json!([["b", "1"], ["a", "2"], ["b", "3"]])
    );
    assert_eq!(value["declaration"], Value::Null);
    assert_eq!(value["doctype"], json!([]));
}
