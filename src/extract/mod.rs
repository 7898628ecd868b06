pub mod level;
pub mod native;
pub mod sentences;

use serde::{Deserialize, Serialize};

use crate::page::Page;

/// One sentence scraped from a correction card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub id: String,
    pub original: String,
    #[serde(default)]
    pub is_title: bool,
}

impl SentenceRecord {
    pub fn new(id: &str, original: &str) -> Self {
        SentenceRecord {
            id: id.to_string(),
            original: original.to_string(),
            is_title: false,
        }
    }

    pub fn title(id: &str, original: &str) -> Self {
        SentenceRecord {
            is_title: true,
            ..Self::new(id, original)
        }
    }
}

/// Everything the prompt needs from a correction page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedPage {
    pub sentences: Vec<SentenceRecord>,
    pub level: Option<String>,
}

pub fn extract_all<P: Page + ?Sized>(page: &P) -> ExtractedPage {
    ExtractedPage {
        sentences: sentences::extract(page),
        level: level::extract(page),
    }
}

// ── Tests ──
