use scraper::{ElementRef, Html, Node};
use tracing::debug;

use super::entities;
use super::{Locator, Page, PageEdit, PageElement, PageNode};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// In-memory document: an owned element tree plus the log of every edit
/// applied to it.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    root: PageElement,
    edits: Vec<PageEdit>,
}

impl MemoryPage {
    /// Parse a full HTML document (a saved LangCorrect page).
    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);
        let root = convert(doc.root_element());
        debug!("Parsed page: {} elements", root.descendants().len() + 1);
        MemoryPage {
            root,
            edits: Vec::new(),
        }
    }

    pub fn from_root(root: PageElement) -> Self {
        MemoryPage {
            root,
            edits: Vec::new(),
        }
    }

    pub fn edits(&self) -> &[PageEdit] {
        &self.edits
    }

    fn elements(&self) -> impl Iterator<Item = &PageElement> {
        std::iter::once(&self.root).chain(self.root.descendants())
    }

    /// Serialize the current tree back to HTML, form values included.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        render(&self.root, &mut out);
        out
    }
}

impl Page for MemoryPage {
    fn find_by_id(&self, id: &str) -> Option<&PageElement> {
        self.elements().find(|el| el.attr("id") == Some(id))
    }

    fn find_by_attribute(&self, name: &str, value: Option<&str>) -> Vec<&PageElement> {
        self.elements()
            .filter(|el| match (el.attr(name), value) {
                (Some(actual), Some(wanted)) => actual == wanted,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .collect()
    }

    fn find_by_class(&self, class: &str) -> Vec<&PageElement> {
        self.elements().filter(|el| el.has_class(class)).collect()
    }

    fn set_value(&mut self, id: &str, value: &str) -> bool {
        let target = Locator::id(id);
        let Some(el) = self.root.find_mut(&|el| target.matches(el)) else {
            return false;
        };
        el.value = Some(value.to_string());
        self.edits.push(PageEdit::SetValue {
            target,
            value: value.to_string(),
        });
        true
    }

    fn set_attribute(&mut self, target: &Locator, name: &str, value: &str) -> bool {
        let Some(el) = self.root.find_mut(&|el| target.matches(el)) else {
            return false;
        };
        el.attrs.insert(name.to_string(), value.to_string());
        self.edits.push(PageEdit::SetAttribute {
            target: target.clone(),
            name: name.to_string(),
            value: value.to_string(),
        });
        true
    }

    fn remove_class(&mut self, target: &Locator, class: &str) -> bool {
        let Some(el) = self.root.find_mut(&|el| target.matches(el)) else {
            return false;
        };
        if let Some(classes) = el.attrs.get_mut("class") {
            *classes = classes
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
        }
        self.edits.push(PageEdit::RemoveClass {
            target: target.clone(),
            class: class.to_string(),
        });
        true
    }

    fn decode_entities(&self, raw: &str) -> String {
        entities::decode_html5(raw)
    }
}

fn convert(el: ElementRef) -> PageElement {
    let mut out = PageElement::new(el.value().name());
    for (name, value) in el.value().attrs() {
        out.attrs.insert(name.to_string(), value.to_string());
    }

    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.children.push(PageNode::Text(String::from(&**text))),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    out.children.push(PageNode::Element(convert(child_el)));
                }
            }
            _ => {}
        }
    }

    out.value = match out.tag.as_str() {
        "textarea" => Some(out.text_content()),
        "input" => Some(out.attr("value").unwrap_or_default().to_string()),
        _ => None,
    };
    out
}

fn render(el: &PageElement, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        if el.tag == "input" && name == "value" {
            continue;
        }
        out.push_str(&format!(" {}=\"{}\"", name, entities::encode(value)));
    }
    if el.tag == "input" {
        if let Some(v) = &el.value {
            out.push_str(&format!(" value=\"{}\"", entities::encode(v)));
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&el.tag.as_str()) {
        return;
    }

    if el.tag == "textarea" {
        let value = el.value.as_deref().unwrap_or_default();
        if value.starts_with('\n') {
            out.push('\n');
        }
        out.push_str(&entities::encode(value));
    } else {
        let raw = RAW_TEXT_TAGS.contains(&el.tag.as_str());
        for child in &el.children {
            match child {
                PageNode::Text(t) if raw => out.push_str(t),
                PageNode::Text(t) => out.push_str(&entities::encode(t)),
                PageNode::Element(c) => render(c, out),
            }
        }
    }

    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}
