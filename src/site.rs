use std::sync::LazyLock;

use regex::Regex;

const SITE_ROOT: &str = "https://langcorrect.com";
static JOURNAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?langcorrect\.com/journals/([A-Za-z0-9_-]+)(/make_corrections)?/?(?:[?#].*)?$")
        .unwrap()
});

/// Which LangCorrect page a URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A journal entry; its native-language text can be collected.
    Journal { slug: String },
    /// The correction form for a journal entry.
    CorrectionPage { slug: String },
    Other,
}

impl PageKind {
    pub fn classify(url: &str) -> Self {
        let Some(caps) = JOURNAL_RE.captures(url.trim()) else {
            return PageKind::Other;
        };
        let slug = caps[1].to_string();
        if caps.get(2).is_some() {
            PageKind::CorrectionPage { slug }
        } else {
            PageKind::Journal { slug }
        }
    }
}

pub fn correction_url(slug: &str) -> String {
    format!("{}/journals/{}/make_corrections", SITE_ROOT, slug)
}
