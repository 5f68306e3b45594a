//! Background overview analysis behind a reference handle
//!
//! `OverviewBridge::invoke` registers an in-progress [`OverviewEntry`],
//! spawns the fan-out/aggregate analysis in the background and returns
//! immediately with an instruction telling the caller to echo a fenced
//! marker carrying the reference. Readers observe progress by polling
//! the store entry until its `finished` flag is set.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use futures::StreamExt;
use tracing::{debug, warn};

use weft_reference::{OverviewEntry, Reference, ReferenceKind, ReferenceStore};
use weft_types::{CompletionError, CompletionService};

use crate::prompts;

/// One self-contained view over the dataset, pre-rendered as text
#[derive(Debug, Clone)]
pub struct Perspective {
    /// Short perspective name
    pub title: String,
    /// What this perspective shows
    pub description: String,
    /// Pre-rendered perspective data
    pub content: String,
}

/// Question-relevant extract of a single perspective
#[derive(Debug, Clone)]
pub struct PerspectiveSummary {
    /// Title of the source perspective
    pub title: String,
    /// Extracted findings
    pub summary: String,
}

/// Supplies the dataset perspectives the analysis fans out over
#[async_trait]
pub trait PerspectiveSource: Send + Sync {
    /// Produce every available perspective
    async fn perspectives(&self) -> Result<Vec<Perspective>, OverviewError>;
}

/// Errors surfaced by the bridge before the background task starts
#[derive(Debug, thiserror::Error)]
pub enum OverviewError {
    /// The perspective source could not produce its views
    #[error("perspective source failed: {0}")]
    SourceFailed(String),

    /// The completion service failed
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Connects a perspective source and a completion service to the
/// reference store.
pub struct OverviewBridge {
    store: Arc<ReferenceStore>,
    completion: Arc<dyn CompletionService>,
    source: Arc<dyn PerspectiveSource>,
    perspectives: tokio::sync::Mutex<Option<Arc<Vec<Perspective>>>>,
}

impl OverviewBridge {
    /// Bridge wiring the given source and completion service to the store
    #[must_use]
    pub fn new(
        store: Arc<ReferenceStore>,
        completion: Arc<dyn CompletionService>,
        source: Arc<dyn PerspectiveSource>,
    ) -> Self {
        Self {
            store,
            completion,
            source,
            perspectives: tokio::sync::Mutex::new(None),
        }
    }

    /// Launches the analysis for `question` and returns the text the
    /// conversational agent should relay to the user.
    ///
    /// Fetching the perspectives happens before the handle is issued, so
    /// a broken source surfaces here rather than inside the background
    /// task. Everything after that runs detached.
    pub async fn invoke(&self, question: &str) -> Result<String, OverviewError> {
        let perspectives = self.cached_perspectives().await?;
        let reference = self.store.store_overview(OverviewEntry::default());
        debug!(reference = reference.as_str(), "overview analysis started");

        tokio::spawn(run_analysis(
            Arc::clone(&self.store),
            Arc::clone(&self.completion),
            perspectives,
            reference.clone(),
            question.to_string(),
        ));

        Ok(format!(
            "Return this fence block as is to the user:\n\n\
```embedded-markdown\n{reference}\n```\n\n\
This will allow the user to see the data overview answer in the chat.\n"
        ))
    }

    async fn cached_perspectives(&self) -> Result<Arc<Vec<Perspective>>, OverviewError> {
        let mut slot = self.perspectives.lock().await;
        if let Some(cached) = slot.as_ref() {
            return Ok(Arc::clone(cached));
        }
        let fetched = Arc::new(self.source.perspectives().await?);
        *slot = Some(Arc::clone(&fetched));
        Ok(fetched)
    }
}

/// Fan-out over the perspectives, then stream the aggregated report into
/// the store entry. Always leaves the entry finished, even on failure,
/// so pollers terminate.
async fn run_analysis(
    store: Arc<ReferenceStore>,
    completion: Arc<dyn CompletionService>,
    perspectives: Arc<Vec<Perspective>>,
    reference: Reference,
    question: String,
) {
    debug_assert_eq!(reference.kind(), ReferenceKind::Overview);

    let extractions = perspectives.iter().map(|perspective| {
        let completion = Arc::clone(&completion);
        let question = question.as_str();
        async move {
            let prompt = prompts::perspective_prompt(perspective, question);
            match completion.complete(&prompt).await {
                Ok(summary) => Some(PerspectiveSummary {
                    title: perspective.title.clone(),
                    summary,
                }),
                Err(err) => {
                    warn!(
                        title = perspective.title.as_str(),
                        error = %err,
                        "perspective extraction failed, skipping"
                    );
                    None
                }
            }
        }
    });
    let summaries: Vec<PerspectiveSummary> =
        join_all(extractions).await.into_iter().flatten().collect();

    if summaries.is_empty() {
        store.update_overview(
            &reference,
            OverviewEntry::finished(
                "The analysis could not be completed: no data perspective could be examined."
                    .to_string(),
            ),
        );
        return;
    }

    let prompt = prompts::aggregate_prompt(&summaries, &question);
    let mut accumulated = String::new();
    let outcome = match completion.complete_stream(&prompt).await {
        Ok(mut tokens) => loop {
            match tokens.next().await {
                Some(fragment) => {
                    accumulated.push_str(&fragment);
                    store.update_overview(
                        &reference,
                        OverviewEntry::in_progress(accumulated.clone()),
                    );
                }
                None => break Ok(()),
            }
        },
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => {
            store.update_overview(&reference, OverviewEntry::finished(accumulated));
            debug!(reference = reference.as_str(), "overview analysis finished");
        }
        Err(err) => {
            warn!(error = %err, "overview aggregation failed");
            if !accumulated.is_empty() {
                accumulated.push_str("\n\n");
            }
            accumulated.push_str(&format!("The analysis could not be completed: {err}"));
            store.update_overview(&reference, OverviewEntry::finished(accumulated));
        }
    }
}
