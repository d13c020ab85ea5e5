//! Contextual enrichment of units before embedding.
//!
//! Each unit is sent to an [`Enricher`] collaborator which returns a short
//! situating context (summary sentence, header breadcrumb, keywords, roughly
//! 50–100 tokens). The unit's text becomes
//! `{context}\n\nCONTENT:\n\n{original}`.
//!
//! Units are dispatched to a semaphore-bounded set of tasks. A failed unit
//! is logged and dropped; the batch itself never fails, and output order is
//! unspecified.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::document::{BlockMeta, Unit};
use crate::error::Result;

/// Marker separating the situating context from the original unit text.
pub const CONTENT_MARKER: &str = "CONTENT:";

/// A collaborator that produces a short situating context for a unit.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Generate a situating context for `text` within its source document.
    ///
    /// `language` is the target natural language for the summary.
    async fn enrich(&self, meta: &BlockMeta, text: &str, language: &str) -> Result<String>;
}

/// Prefix the unit's text with the enrichment context.
fn apply_context(mut unit: Unit, context: &str) -> Unit {
    let original = unit.text.trim().to_string();
    unit.text = format!("{context}\n\n{CONTENT_MARKER}\n\n{original}").trim().to_string();
    unit
}

/// Enrich a batch of units with at most `max_workers` concurrent calls.
///
/// Failures are logged with the unit's id and the failing unit is dropped
/// from the output; the remaining units are unaffected. The returned order
/// is completion order, not input order — downstream stages must treat the
/// result as a set.
pub async fn enrich_units(
    units: Vec<Unit>,
    enricher: Arc<dyn Enricher>,
    max_workers: usize,
    language: &str,
) -> Vec<Unit> {
    let input_count = units.len();
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut tasks = JoinSet::new();

    for unit in units {
        let enricher = Arc::clone(&enricher);
        let semaphore = Arc::clone(&semaphore);
        let language = language.to_string();
        tasks.spawn(async move {
            // Closed only when the pool itself is dropped, which cannot
            // happen while tasks are still joined below.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let context = enricher.enrich(&unit.meta, unit.text.trim(), &language).await;
            (unit, context)
        });
    }

    let mut enriched = Vec::with_capacity(input_count);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((unit, Ok(context))) => enriched.push(apply_context(unit, &context)),
            Ok((unit, Err(e))) => {
                warn!(unit = %unit.id, error = %e, "enrichment failed, dropping unit");
            }
            Err(e) => {
                warn!(error = %e, "enrichment task panicked, dropping unit");
            }
        }
    }

    info!(
        input_count,
        enriched_count = enriched.len(),
        dropped = input_count - enriched.len(),
        "enrichment batch completed"
    );
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockMeta;
    use crate::error::RagError;

    struct FlakyEnricher {
        /// Units whose text contains this marker fail deterministically.
        poison: &'static str,
    }

    #[async_trait]
    impl Enricher for FlakyEnricher {
        async fn enrich(&self, meta: &BlockMeta, text: &str, language: &str) -> Result<String> {
            if text.contains(self.poison) {
                return Err(RagError::EnrichmentError {
                    provider: "flaky".to_string(),
                    message: "poisoned unit".to_string(),
                });
            }
            Ok(format!("SUMMARY CONTEXT: {} ({language}) {}", meta.file_name, text.len()))
        }
    }

    fn unit(id: &str, text: &str) -> Unit {
        Unit {
            id: id.to_string(),
            text: text.to_string(),
            paragraph_id: format!("p_{id}"),
            paragraph_full_content: text.to_string(),
            meta: BlockMeta {
                file_name: "a.md".to_string(),
                file_path: "/docs/a.md".to_string(),
                header_path: None,
            },
            embedding: Vec::new(),
        }
    }

    #[tokio::test]
    async fn partial_failure_drops_only_the_failing_unit() {
        let units = vec![
            unit("u1", "fine one"),
            unit("u2", "BAD apple"),
            unit("u3", "fine two"),
        ];
        let enricher = Arc::new(FlakyEnricher { poison: "BAD" });

        let enriched = enrich_units(units, enricher, 2, "English").await;
        assert_eq!(enriched.len(), 2);
        assert!(enriched.iter().all(|u| u.id != "u2"));
    }

    #[tokio::test]
    async fn enriched_text_wraps_original_behind_content_marker() {
        let units = vec![unit("u1", "  original text  ")];
        let enricher = Arc::new(FlakyEnricher { poison: "\u{0}" });

        let enriched = enrich_units(units, enricher, 4, "Vietnamese").await;
        assert_eq!(enriched.len(), 1);
        let text = &enriched[0].text;
        assert!(text.starts_with("SUMMARY CONTEXT:"));
        assert!(text.contains("\n\nCONTENT:\n\n"));
        assert!(text.ends_with("original text"));
        // Backreference fields survive enrichment untouched.
        assert_eq!(enriched[0].paragraph_full_content, "  original text  ");
    }

    #[tokio::test]
    async fn worker_bound_of_one_still_processes_everything() {
        let units: Vec<Unit> =
            (0..8).map(|i| unit(&format!("u{i}"), &format!("text {i}"))).collect();
        let enricher = Arc::new(FlakyEnricher { poison: "\u{0}" });

        let enriched = enrich_units(units, enricher, 1, "English").await;
        assert_eq!(enriched.len(), 8);
    }
}
