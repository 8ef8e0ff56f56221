//! Sequential batch runs.
//!
//! Documents are summarized one after another. A document that comes out
//! empty, fails to summarize or fails to be written is counted and the run
//! moves on to the next one.

use crate::document::Document;
use crate::output::write_summary;
use crate::summarizer::{SummaryContext, SummaryOutcome};
use crate::{log_error, logging};
use std::path::Path;

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub written: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Summarize `docs` in order, writing files into `out_dir` for every summary.
pub async fn run_batch(ctx: &SummaryContext, docs: &[Document], out_dir: &Path) -> BatchReport {
    let mut report = BatchReport::default();

    for doc in docs {
        let outcome = match ctx.summarize_document(doc).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(document = %doc.id, "{}", e);
                log_error!("{}: {}", doc.id, e);
                report.failed += 1;
                continue;
            }
        };
        logging::log_outcome(&doc.id, &outcome);

        match outcome {
            SummaryOutcome::Summary(summary) => match write_summary(out_dir, &doc.id, &summary) {
                Ok(_) => report.written += 1,
                Err(e) => {
                    tracing::error!(document = %doc.id, "failed to write summary: {}", e);
                    log_error!("{}: failed to write summary: {}", doc.id, e);
                    report.failed += 1;
                }
            },
            SummaryOutcome::Empty(_) => report.empty += 1,
        }
    }

    report
}
