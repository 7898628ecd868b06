use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::page::{Locator, Page};
use crate::reconcile::ReconciledBatch;

const CARD_ID_ATTR: &str = "data-sentence-id";
const CORRECTION_BOX_ATTR: &str = "data-correction-box";
const HIDDEN_CLASS: &str = "d-none";
const PERFECT_BUTTON_CLASS: &str = "js-mark-as-perfect";
const FEEDBACK_ID: &str = "overall-feedback";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyStats {
    pub perfect: usize,
    pub corrected: usize,
    pub missing: usize,
    pub feedback_written: bool,
}

pub fn correction_row_id(id: &str) -> String {
    format!("js-correction-row-{}", id)
}

pub fn correction_note_id(id: &str) -> String {
    format!("js-correction-note-{}", id)
}

/// Write a reconciled batch into the correction form.
///
/// Correction boxes are revealed first, then after `fill_delay` (time for
/// the host page's own scripts to finish showing them) the textareas are
/// filled. A card missing from the page is skipped, and a perfect card is
/// only marked when it offers a perfect button.
pub async fn apply_corrections<P: Page + ?Sized>(
    page: &mut P,
    batch: &ReconciledBatch,
    fill_delay: Duration,
) -> ApplyStats {
    let mut stats = ApplyStats::default();
    let mut to_fill = Vec::new();

    for correction in &batch.corrections {
        let card = Locator::attribute(CARD_ID_ATTR, correction.id.as_str());
        let can_mark_perfect = match page.find_by_attribute(CARD_ID_ATTR, Some(&correction.id)).first() {
            Some(el) => el.find_class_path(&[PERFECT_BUTTON_CLASS]).is_some(),
            None => {
                warn!("No correction card for sentence {}, skipping", correction.id);
                stats.missing += 1;
                continue;
            }
        };

        if correction.perfect {
            if can_mark_perfect {
                page.set_attribute(&card, "data-action", "perfect");
                stats.perfect += 1;
            } else {
                debug!("Card {} has no perfect button, leaving it unmarked", correction.id);
            }
            continue;
        }

        let correction_box = Locator::attribute(CORRECTION_BOX_ATTR, correction.id.as_str());
        if !page.remove_class(&correction_box, HIDDEN_CLASS) {
            debug!("No correction box for sentence {}", correction.id);
        }
        to_fill.push((card, correction));
    }

    if !to_fill.is_empty() && !fill_delay.is_zero() {
        tokio::time::sleep(fill_delay).await;
    }

    for (card, correction) in to_fill {
        if !page.set_value(&correction_row_id(&correction.id), &correction.revised) {
            warn!("Missing revision field for sentence {}", correction.id);
        }
        if !page.set_value(&correction_note_id(&correction.id), &correction.note) {
            warn!("Missing note field for sentence {}", correction.id);
        }
        page.set_attribute(&card, "data-action", "corrected");
        stats.corrected += 1;
    }

    if !batch.feedback.is_empty() {
        stats.feedback_written = page.set_value(FEEDBACK_ID, &batch.feedback);
        if !stats.feedback_written {
            warn!("No overall feedback field on page");
        }
    }

    debug!(
        "Applied {} perfect, {} corrected, {} missing",
        stats.perfect, stats.corrected, stats.missing
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{MemoryPage, PageEdit};
    use crate::reconcile::CorrectionResult;

    fn load() -> MemoryPage {
        let html = std::fs::read_to_string("tests/fixtures/make_corrections.html").unwrap();
        MemoryPage::parse(&html)
    }

    fn corrected(id: &str, revised: &str, note: &str) -> CorrectionResult {
        CorrectionResult {
            id: id.into(),
            perfect: false,
            revised: revised.into(),
            note: note.into(),
        }
    }

    fn perfect(id: &str) -> CorrectionResult {
        CorrectionResult {
            id: id.into(),
            perfect: true,
            revised: String::new(),
            note: String::new(),
        }
    }

    fn value(page: &MemoryPage, id: &str) -> Option<String> {
        page.find_by_id(id).and_then(|el| el.value.clone())
    }

    fn card_action(page: &MemoryPage, id: &str) -> Option<String> {
        page.find_by_attribute("data-sentence-id", Some(id))[0]
            .attr("data-action")
            .map(str::to_string)
    }

    #[tokio::test]
    async fn fills_revision_and_note() {
        let mut page = load();
        let batch = ReconciledBatch {
            corrections: vec![corrected(
                "1218882",
                "My son recently found out that he failed the October entrance exam.",
                "More natural phrasing.",
            )],
            feedback: String::new(),
        };
        let stats = apply_corrections(&mut page, &batch, Duration::ZERO).await;

        assert_eq!(stats.corrected, 1);
        assert_eq!(
            value(&page, "js-correction-row-1218882").as_deref(),
            Some("My son recently found out that he failed the October entrance exam.")
        );
        assert_eq!(value(&page, "js-correction-note-1218882").as_deref(), Some("More natural phrasing."));
        assert_eq!(card_action(&page, "1218882").as_deref(), Some("corrected"));
    }

    #[tokio::test]
    async fn reveals_correction_box() {
        let mut page = load();
        let batch = ReconciledBatch {
            corrections: vec![corrected("1218882", "Changed text", "Some note")],
            feedback: String::new(),
        };
        apply_corrections(&mut page, &batch, Duration::ZERO).await;

        let boxes = page.find_by_attribute("data-correction-box", Some("1218882"));
        assert!(!boxes[0].has_class("d-none"));
        assert!(boxes[0].has_class("correction-box"));
    }

    #[tokio::test]
    async fn marks_perfect_cards_without_touching_fields() {
        let mut page = load();
        let batch = ReconciledBatch {
            corrections: vec![perfect("1218884")],
            feedback: String::new(),
        };
        let stats = apply_corrections(&mut page, &batch, Duration::ZERO).await;

        assert_eq!(stats.perfect, 1);
        assert_eq!(card_action(&page, "1218884").as_deref(), Some("perfect"));
        assert_eq!(value(&page, "js-correction-row-1218884").as_deref(), Some(""));
        let boxes = page.find_by_attribute("data-correction-box", Some("1218884"));
        assert!(boxes[0].has_class("d-none"));
    }

    #[tokio::test]
    async fn applies_mixed_batch_and_feedback() {
        let mut page = load();
        let batch = ReconciledBatch {
            corrections: vec![
                perfect("1218881"),
                corrected("1218882", "Corrected text", "Note 1"),
                perfect("1218883"),
            ],
            feedback: "Great writing! Keep up the good work.".into(),
        };
        let stats = apply_corrections(&mut page, &batch, Duration::from_millis(1)).await;

        assert_eq!(
            stats,
            ApplyStats {
                perfect: 2,
                corrected: 1,
                missing: 0,
                feedback_written: true
            }
        );
        assert_eq!(card_action(&page, "1218881").as_deref(), Some("perfect"));
        assert_eq!(value(&page, "js-correction-row-1218882").as_deref(), Some("Corrected text"));
        assert_eq!(card_action(&page, "1218883").as_deref(), Some("perfect"));
        assert_eq!(
            value(&page, "overall-feedback").as_deref(),
            Some("Great writing! Keep up the good work.")
        );
    }

    #[tokio::test]
    async fn reveal_edits_precede_fill_edits() {
        let mut page = load();
        let batch = ReconciledBatch {
            corrections: vec![corrected("1218882", "A", "a"), corrected("1218883", "B", "b")],
            feedback: String::new(),
        };
        apply_corrections(&mut page, &batch, Duration::ZERO).await;

        let edits = page.edits();
        let last_reveal = edits
            .iter()
            .rposition(|e| matches!(e, PageEdit::RemoveClass { .. }))
            .unwrap();
        let first_fill = edits
            .iter()
            .position(|e| matches!(e, PageEdit::SetValue { .. }))
            .unwrap();
        assert!(last_reveal < first_fill);
    }

    #[tokio::test]
    async fn unknown_cards_are_counted_and_skipped() {
        let mut page = load();
        let batch = ReconciledBatch {
            corrections: vec![corrected("999", "x", "y")],
            feedback: String::new(),
        };
        let stats = apply_corrections(&mut page, &batch, Duration::ZERO).await;
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.corrected, 0);
        assert!(page.edits().is_empty());
    }

    #[tokio::test]
    async fn empty_feedback_is_not_written() {
        let mut page = load();
        let stats = apply_corrections(&mut page, &ReconciledBatch::default(), Duration::ZERO).await;
        assert!(!stats.feedback_written);
        assert_eq!(value(&page, "overall-feedback").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn perfect_needs_a_perfect_button() {
        let mut page = MemoryPage::parse(
            r#"<html><body>
            <div class="card js-correction-card" data-sentence-id="5" data-original-sentence="Locked.">
              <p class="js-sentence">Locked.</p>
            </div>
            </body></html>"#,
        );
        let batch = ReconciledBatch {
            corrections: vec![perfect("5")],
            feedback: String::new(),
        };
        let stats = apply_corrections(&mut page, &batch, Duration::ZERO).await;

        assert_eq!(stats.perfect, 0);
        assert_eq!(stats.missing, 0);
        assert_eq!(card_action(&page, "5"), None);
        assert!(page.edits().is_empty());
    }
}
