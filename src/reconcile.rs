use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ReconcileError;
use crate::extract::SentenceRecord;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub id: String,
    pub perfect: bool,
    pub revised: String,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledBatch {
    pub corrections: Vec<CorrectionResult>,
    pub feedback: String,
}

impl ReconciledBatch {
    pub fn perfect_count(&self) -> usize {
        self.corrections.iter().filter(|c| c.perfect).count()
    }
}

/// Match a provider answer back onto the sentences it was asked about.
///
/// Entry `i` of the `corrections` array belongs to `sentences[i]`; any index
/// or id the model echoes back is ignored. All or nothing.
pub fn reconcile(
    response: &str,
    sentences: &[SentenceRecord],
) -> Result<ReconciledBatch, ReconcileError> {
    let payload = strip_fence(response);
    let parsed: Value = serde_json::from_str(payload).map_err(ReconcileError::Malformed)?;

    let entries = parsed
        .get("corrections")
        .and_then(Value::as_array)
        .ok_or(ReconcileError::MissingCorrections)?;

    if entries.len() != sentences.len() {
        return Err(ReconcileError::LengthMismatch {
            actual: entries.len(),
            expected: sentences.len(),
        });
    }

    let corrections: Vec<CorrectionResult> = entries
        .iter()
        .zip(sentences)
        .map(|(entry, sentence)| to_correction(entry, sentence))
        .collect();

    let feedback = text_field(&parsed, "feedback");

    debug!(
        "Reconciled {} corrections ({} perfect)",
        corrections.len(),
        corrections.iter().filter(|c| c.perfect).count()
    );
    Ok(ReconciledBatch {
        corrections,
        feedback,
    })
}

/// The interior of the first fenced block, or the trimmed input when there
/// is none.
pub fn strip_fence(response: &str) -> &str {
    let trimmed = response.trim();
    match FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

fn to_correction(entry: &Value, sentence: &SentenceRecord) -> CorrectionResult {
    let perfect = entry.get("perfect").and_then(Value::as_bool).unwrap_or(false);
    if perfect {
        return CorrectionResult {
            id: sentence.id.clone(),
            perfect,
            revised: String::new(),
            note: String::new(),
        };
    }
    CorrectionResult {
        id: sentence.id.clone(),
        perfect,
        revised: text_field(entry, "revised"),
        note: text_field(entry, "note"),
    }
}

fn text_field(obj: &Value, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
