//! XML data model

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Pos;

/// How attributes are stored, chosen once per parser
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttributePolicy {
    /// Keys must be unique; enumeration is in key order
    #[default]
    Sorted,
    /// Duplicates allowed; enumeration is in document order
    Unsorted,
}

/// Attribute store of one element
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Attributes {
    Sorted(BTreeMap<String, String>),
    Unsorted(Vec<(String, String)>),
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new(AttributePolicy::default())
    }
}

impl Attributes {
    pub const fn new(policy: AttributePolicy) -> Self {
        match policy {
            AttributePolicy::Sorted => Self::Sorted(BTreeMap::new()),
            AttributePolicy::Unsorted => Self::Unsorted(Vec::new()),
        }
    }

    pub const fn policy(&self) -> AttributePolicy {
        match self {
            Self::Sorted(_) => AttributePolicy::Sorted,
            Self::Unsorted(_) => AttributePolicy::Unsorted,
        }
    }

    /// Value for `key`. With duplicates, the last one wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Self::Sorted(map) => map.get(key).map(String::as_str),
            Self::Unsorted(list) => list
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
        }
    }

    /// Every value stored under `key`, in document order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Sorted(map) => map.len(),
            Self::Unsorted(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
        match self {
            Self::Sorted(map) => Box::new(map.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
            Self::Unsorted(list) => {
                Box::new(list.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            }
        }
    }

    /// Insert a pair. Returns `false` when a sorted store already has `key`,
    /// leaving the existing value in place.
    pub fn insert(&mut self, key: String, value: String) -> bool {
        match self {
            Self::Sorted(map) => {
                if map.contains_key(&key) {
                    return false;
                }
                map.insert(key, value);
                true
            }
            Self::Unsorted(list) => {
                list.push((key, value));
                true
            }
        }
    }
}

/// XML element
///
/// `Clone`, `PartialEq`, `Debug` and `Drop` walk the subtree with an explicit
/// stack. Serialization recurses once per nesting level; check [`Element::depth`]
/// before serializing documents parsed without a depth limit.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Attributes,
    pub(crate) text: String,
    pub(crate) children: Vec<Element>,
    pub(crate) pos: Pos,
    pub(crate) closed_explicitly: bool,
}

impl Element {
    pub fn new(name: impl Into<String>, policy: AttributePolicy, pos: Pos) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(policy),
            text: String::new(),
            children: Vec::new(),
            pos,
            closed_explicitly: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    pub fn attribute_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.attributes.get(key).unwrap_or(default)
    }

    /// Character data directly inside this element, child text excluded
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Position of the `<` that opened this element
    pub const fn position(&self) -> Pos {
        self.pos
    }

    /// `true` for `<a></a>`, `false` for `<a/>`
    pub const fn is_closed_explicitly(&self) -> bool {
        self.closed_explicitly
    }

    /// First child named `name`
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a `/`-separated path of child names, e.g. `"head/title"`
    pub fn find(&self, path: &str) -> Option<&Self> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |element, segment| element.child(segment))
    }

    /// This element and all its descendants in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Levels in this subtree; 1 for an element without children
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((element, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(element.children.iter().map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// Copy of this element without its children
    fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            text: self.text.clone(),
            children: Vec::with_capacity(self.children.len()),
            pos: self.pos,
            closed_explicitly: self.closed_explicitly,
        }
    }

    fn same_node(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attributes == other.attributes
            && self.text == other.text
            && self.pos == other.pos
            && self.closed_explicitly == other.closed_explicitly
            && self.children.len() == other.children.len()
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        // (source, index of next child to copy, copy under construction)
        let mut stack: Vec<(&Self, usize, Self)> = Vec::new();
        let mut current = (self, 0, self.shallow_clone());
        loop {
            let source = current.0;
            if let Some(child) = source.children.get(current.1) {
                current.1 += 1;
                let parent = std::mem::replace(&mut current, (child, 0, child.shallow_clone()));
                stack.push(parent);
                continue;
            }
            match stack.pop() {
                Some(mut parent) => {
                    parent.2.children.push(current.2);
                    current = parent;
                }
                None => return current.2,
            }
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.same_node(b) {
                return false;
            }
            pending.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

/// Pre-order list of nodes with their depth below the receiver
impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        let mut stack = vec![(self, 0usize)];
        while let Some((element, depth)) = stack.pop() {
            list.entry(&Node { element, depth });
            stack.extend(element.children.iter().rev().map(|c| (c, depth + 1)));
        }
        list.finish()
    }
}

struct Node<'a> {
    element: &'a Element,
    depth: usize,
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("depth", &self.depth)
            .field("name", &self.element.name)
            .field("attributes", &self.element.attributes)
            .field("text", &self.element.text)
            .field("pos", &self.element.pos)
            .field("closed_explicitly", &self.element.closed_explicitly)
            .finish()
    }
}

impl Drop for Element {
    // Flatten the subtree so deep documents are freed without recursion
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

/// Pre-order iterator over an element subtree
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// Parsed XML document
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    pub(crate) declaration: Option<Element>,
    pub(crate) doctype: Vec<String>,
    pub(crate) root: Element,
}

impl Document {
    /// The `<?xml ...?>` pseudo-element, named `xml`
    pub const fn declaration(&self) -> Option<&Element> {
        self.declaration.as_ref()
    }

    /// Raw tokens between `<!DOCTYPE` and `>`
    pub fn doctype(&self) -> &[String] {
        &self.doctype
    }

    pub const fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    pub fn version(&self) -> Option<&str> {
        self.declaration.as_ref()?.attribute("version")
    }

    pub fn encoding(&self) -> Option<&str> {
        self.declaration.as_ref()?.attribute("encoding")
    }
}
