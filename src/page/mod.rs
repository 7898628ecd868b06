pub mod entities;
pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use memory::MemoryPage;

/// Owned snapshot of one element and its subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageElement {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<PageNode>,
    /// Current form value for `textarea`/`input`; `None` for other tags.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageNode {
    Element(PageElement),
    Text(String),
}

/// How a mutation addresses its target: by `id`, or by the first element
/// carrying an attribute with an exact value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    Id { id: String },
    Attribute { name: String, value: String },
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id { id: id.into() }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Locator::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, el: &PageElement) -> bool {
        match self {
            Locator::Id { id } => el.attr("id") == Some(id.as_str()),
            Locator::Attribute { name, value } => el.attr(name) == Some(value.as_str()),
        }
    }
}

/// One applied mutation. The ordered list of edits is the fill plan a
/// browser-side script replays on the live page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PageEdit {
    SetValue { target: Locator, value: String },
    SetAttribute { target: Locator, name: String, value: String },
    RemoveClass { target: Locator, class: String },
}

/// Capabilities the extractor and form writer need from a host document.
pub trait Page {
    fn find_by_id(&self, id: &str) -> Option<&PageElement>;

    /// Elements carrying `name`, in document order. With `Some(value)` the
    /// attribute must match exactly.
    fn find_by_attribute(&self, name: &str, value: Option<&str>) -> Vec<&PageElement>;

    fn find_by_class(&self, class: &str) -> Vec<&PageElement>;

    /// Set the form value of the element with this id. Returns false when
    /// no such element exists.
    fn set_value(&mut self, id: &str, value: &str) -> bool;

    fn set_attribute(&mut self, target: &Locator, name: &str, value: &str) -> bool;

    fn remove_class(&mut self, target: &Locator, class: &str) -> bool;

    /// Resolve HTML entities in raw attribute text. Hosts with a real HTML
    /// tokenizer override this; the default is the fixed fallback table.
    fn decode_entities(&self, raw: &str) -> String {
        entities::decode_with_table(raw)
    }
}

impl PageElement {
    pub fn new(tag: &str) -> Self {
        PageElement {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_child(mut self, child: PageElement) -> Self {
        self.children.push(PageNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(PageNode::Text(text.to_string()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of the subtree, like DOM `textContent`.
    pub fn text_content(&self) -> String {
        self.text_excluding(&[])
    }

    /// `textContent` with the subtrees of the given tags left out.
    pub fn text_excluding(&self, skip_tags: &[&str]) -> String {
        let mut out = String::new();
        self.push_text(skip_tags, &mut out);
        out
    }

    fn push_text(&self, skip_tags: &[&str], out: &mut String) {
        for child in &self.children {
            match child {
                PageNode::Text(t) => out.push_str(t),
                PageNode::Element(el) if skip_tags.contains(&el.tag.as_str()) => {}
                PageNode::Element(el) => el.push_text(skip_tags, out),
            }
        }
    }

    /// All descendant elements in document order (self excluded).
    pub fn descendants(&self) -> Vec<&PageElement> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a PageElement>) {
        for child in &self.children {
            if let PageNode::Element(el) = child {
                out.push(el);
                el.collect_descendants(out);
            }
        }
    }

    /// First descendant matching a chain of classes, like the CSS
    /// descendant selector `.a .b`.
    pub fn find_class_path(&self, classes: &[&str]) -> Option<&PageElement> {
        let (first, rest) = classes.split_first()?;
        self.descendants()
            .into_iter()
            .filter(|el| el.has_class(first))
            .find_map(|el| {
                if rest.is_empty() {
                    Some(el)
                } else {
                    el.find_class_path(rest)
                }
            })
    }

    /// First element in the subtree (self included) accepted by `pred`.
    pub fn find_mut(&mut self, pred: &dyn Fn(&PageElement) -> bool) -> Option<&mut PageElement> {
        if pred(self) {
            return Some(self);
        }
        for child in &mut self.children {
            if let PageNode::Element(el) = child {
                if let Some(found) = el.find_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_span() -> PageElement {
        PageElement::new("span")
            .with_attr("data-bs-title", "Language level")
            .with_child(PageElement::new("i").with_attr("class", "fa fa-signal"))
            .with_text(" B2 ")
    }

    #[test]
    fn text_content_includes_all_text() {
        let el = PageElement::new("p")
            .with_text("Hello ")
            .with_child(PageElement::new("b").with_text("world"));
        assert_eq!(el.text_content(), "Hello world");
    }

    #[test]
    fn text_excluding_drops_icon() {
        let el = level_span();
        assert_eq!(el.text_excluding(&["i"]).trim(), "B2");
    }

    #[test]
    fn has_class_splits_on_whitespace() {
        let el = PageElement::new("div").with_attr("class", "card  js-correction-card mb-3");
        assert!(el.has_class("js-correction-card"));
        assert!(!el.has_class("js-correction"));
    }

    #[test]
    fn class_path_requires_nesting() {
        let card = PageElement::new("div")
            .with_child(PageElement::new("span").with_attr("class", "badge").with_text("Stray"))
            .with_child(
                PageElement::new("div")
                    .with_attr("class", "js-sentence")
                    .with_child(PageElement::new("span").with_attr("class", "badge").with_text("Post title")),
            );
        let badge = card.find_class_path(&["js-sentence", "badge"]).unwrap();
        assert_eq!(badge.text_content(), "Post title");
    }

    #[test]
    fn locator_serializes_tagged() {
        let edit = PageEdit::SetValue {
            target: Locator::id("overall-feedback"),
            value: "Nice".into(),
        };
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["op"], "set_value");
        assert_eq!(json["target"]["by"], "id");
        assert_eq!(json["target"]["id"], "overall-feedback");
    }
}
