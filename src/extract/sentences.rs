use tracing::{debug, warn};

use super::SentenceRecord;
use crate::page::{Page, PageElement};

const CARD_CLASS: &str = "js-correction-card";
const TITLE_BADGE_PATH: &[&str] = &["js-sentence", "badge"];
const TITLE_BADGE_TEXT: &str = "Post title";

pub fn extract<P: Page + ?Sized>(page: &P) -> Vec<SentenceRecord> {
    let cards = page.find_by_class(CARD_CLASS);
    let mut sentences = Vec::with_capacity(cards.len());

    for card in &cards {
        let id = card.attr("data-sentence-id").filter(|s| !s.is_empty());
        let original = card.attr("data-original-sentence").filter(|s| !s.is_empty());

        let (Some(id), Some(original)) = (id, original) else {
            debug!("Skipping correction card without id or original sentence");
            continue;
        };

        if sentences.iter().any(|s: &SentenceRecord| s.id == id) {
            warn!("Duplicate sentence id {} on page, keeping the first card", id);
            continue;
        }

        sentences.push(SentenceRecord {
            id: id.to_string(),
            original: page.decode_entities(original),
            is_title: is_title_card(card),
        });
    }

    debug!("Extracted {} sentences from {} cards", sentences.len(), cards.len());
    sentences
}

fn is_title_card(card: &PageElement) -> bool {
    card.find_class_path(TITLE_BADGE_PATH)
        .is_some_and(|badge| badge.text_content().trim() == TITLE_BADGE_TEXT)
}
