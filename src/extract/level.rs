use crate::page::Page;

const LEVEL_ATTR: &str = "data-bs-title";
const LEVEL_LABEL: &str = "Language level";

/// Learner proficiency code ("A1".."C2") from the labelled badge, with the
/// icon markup dropped.
pub fn extract<P: Page + ?Sized>(page: &P) -> Option<String> {
    let span = page
        .find_by_attribute(LEVEL_ATTR, Some(LEVEL_LABEL))
        .into_iter()
        .next()?;
    let level = span.text_excluding(&["i"]).trim().to_string();
    (!level.is_empty()).then_some(level)
}
