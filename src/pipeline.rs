use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::apply::{apply_corrections, ApplyStats};
use crate::error::CycleError;
use crate::extract;
use crate::page::Page;
use crate::prompt::build_prompt;
use crate::provider::Completer;
use crate::reconcile::{reconcile, ReconciledBatch};

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub sentences: usize,
    pub level: Option<String>,
    pub batch: ReconciledBatch,
    pub applied: ApplyStats,
}

/// One user-triggered correction cycle: extract, prompt, call the provider,
/// reconcile, write back. The first failure ends the cycle; edits already
/// written stay on the page.
pub async fn run_cycle<P, C>(
    page: &mut P,
    completer: &C,
    native_text: Option<&str>,
    fill_delay: Duration,
) -> Result<CycleReport, CycleError>
where
    P: Page + ?Sized,
    C: Completer,
{
    let t0 = Instant::now();
    let extracted = extract::extract_all(&*page);
    if extracted.sentences.is_empty() {
        return Err(CycleError::NoSentences);
    }
    info!(
        "Found {} sentences to correct (level: {}, native text: {})",
        extracted.sentences.len(),
        extracted.level.as_deref().unwrap_or("unknown"),
        if native_text.is_some() { "yes" } else { "no" }
    );

    let prompt = build_prompt(&extracted.sentences, extracted.level.as_deref(), native_text);
    let raw = completer.complete(&prompt).await?;
    let batch = reconcile(&raw, &extracted.sentences)?;
    let applied = apply_corrections(page, &batch, fill_delay).await;

    info!(
        "Applied {} corrections in {:.1}s",
        batch.corrections.len(),
        t0.elapsed().as_secs_f64()
    );
    Ok(CycleReport {
        sentences: extracted.sentences.len(),
        level: extracted.level,
        batch,
        applied,
    })
}
