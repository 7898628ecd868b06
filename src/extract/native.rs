use std::sync::LazyLock;

use regex::Regex;

use crate::page::{Page, PageElement, PageNode};

static BLANK_RUNS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

const BODY_BLOCK_CLASS: &str = "post-body";
const ENGLISH: &str = "en";

/// Native-language reference text from a journal entry page: the first body
/// block tagged with a `lang` other than English.
pub fn extract<P: Page + ?Sized>(page: &P) -> Option<String> {
    let block = page
        .find_by_class(BODY_BLOCK_CLASS)
        .into_iter()
        .find(|el| el.attr("lang").is_some_and(|lang| !lang.is_empty() && lang != ENGLISH))?;

    let text = normalize_breaks(&text_with_breaks(block));
    (!text.is_empty()).then_some(text)
}

fn text_with_breaks(el: &PageElement) -> String {
    let mut out = String::new();
    push_text(el, &mut out);
    out
}

fn push_text(el: &PageElement, out: &mut String) {
    for child in &el.children {
        match child {
            PageNode::Text(t) => out.push_str(t),
            PageNode::Element(br) if br.tag == "br" => out.push_str("\n\n"),
            PageNode::Element(inner) => push_text(inner, out),
        }
    }
}

/// Trim each line, then collapse any run of blank lines into one.
fn normalize_breaks(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();
    BLANK_RUNS_RE
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaks_become_blank_lines() {
        assert_eq!(normalize_breaks("first\n\nsecond"), "first\n\nsecond");
        assert_eq!(normalize_breaks("  a  \n\n\n\n\n  b "), "a\n\nb");
    }

    #[test]
    fn nested_breaks_are_found() {
        let el = PageElement::new("div")
            .with_text("一行目")
            .with_child(PageElement::new("br"))
            .with_child(PageElement::new("p").with_text("二行目").with_child(PageElement::new("br")))
            .with_text("三行目");
        assert_eq!(normalize_breaks(&text_with_breaks(&el)), "一行目\n\n二行目\n\n三行目");
    }
}
