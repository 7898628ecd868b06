use scraper::{Html, Selector};
use std::sync::LazyLock;

static TEXTAREA_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("textarea").unwrap());

/// Fallback substitutions for pages without an HTML tokenizer at hand.
///
/// Known limitation: only these five entities are recognised. Other named
/// entities (`&nbsp;`, `&eacute;`, ...) and arbitrary numeric references pass
/// through untouched. `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
const FALLBACK_TABLE: &[(&str, &str)] = &[
    ("&#39;", "'"),
    ("&quot;", "\""),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
];

pub fn decode_with_table(s: &str) -> String {
    FALLBACK_TABLE
        .iter()
        .fold(s.to_string(), |acc, (entity, ch)| acc.replace(entity, ch))
}

/// Decode every HTML entity the way a browser decodes a textarea's content.
///
/// The text is fed to the HTML5 tokenizer as RCDATA, so numeric and named
/// references are resolved while markup stays literal. Falls back to the
/// table when the input would terminate the textarea early.
pub fn decode_html5(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    if s.to_ascii_lowercase().contains("</textarea") {
        return decode_with_table(s);
    }

    // The parser drops one newline right after `<textarea>`; give it this one.
    let fragment = Html::parse_fragment(&format!("<textarea>\n{}</textarea>", s));
    match fragment.select(&TEXTAREA_SEL).next() {
        Some(el) => el.text().collect(),
        None => decode_with_table(s),
    }
}

/// Escape text for HTML output. Inverse of the decoders for the five
/// entities in the fallback table.
pub fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_decodes_common_entities() {
        assert_eq!(decode_with_table("didn&#39;t"), "didn't");
        assert_eq!(decode_with_table("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_with_table("a &lt;b&gt; &amp; c"), "a <b> & c");
    }

    #[test]
    fn table_does_not_double_decode() {
        assert_eq!(decode_with_table("&amp;lt;"), "&lt;");
    }

    #[test]
    fn table_leaves_unknown_entities() {
        assert_eq!(decode_with_table("caf&eacute;"), "caf&eacute;");
    }

    #[test]
    fn html5_decodes_named_and_numeric() {
        assert_eq!(decode_html5("didn&#39;t"), "didn't");
        assert_eq!(decode_html5("caf&eacute;"), "café");
        assert_eq!(decode_html5("&#x4E2D;&#25991;"), "中文");
        assert_eq!(decode_html5("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn html5_keeps_markup_literal() {
        assert_eq!(decode_html5("<b>bold</b> &amp; more"), "<b>bold</b> & more");
    }

    #[test]
    fn html5_without_entities_is_identity() {
        assert_eq!(decode_html5("plain text"), "plain text");
    }

    #[test]
    fn html5_keeps_leading_newline() {
        assert_eq!(decode_html5("\nline &amp; more"), "\nline & more");
        assert_eq!(decode_html5("\n\n&lt;b&gt;"), "\n\n<b>");
    }

    #[test]
    fn html5_refuses_textarea_breakout() {
        assert_eq!(decode_html5("x</textarea>&amp;"), "x</textarea>&");
    }

    #[test]
    fn decode_then_encode_is_lossless() {
        for encoded in ["didn&#39;t", "&quot;quoted&quot;", "a &amp; b", "&lt;tag&gt;"] {
            assert_eq!(encode(&decode_html5(encoded)), encoded);
            assert_eq!(encode(&decode_with_table(encoded)), encoded);
        }
    }
}
