//! Conclusion-reason blocks
//!
//! The model justifies findings with `conclusion-reason` blocks. Each block
//! renders immediately as a card with a progress note; once the message is
//! finished, a follow-up task runs a two-stage completion refinement (a next
//! step derived from the insight, then a short action phrase) and streams the
//! result into the card through the patch board.

use crate::error::ProcessorError;
use crate::markup::render_plain_markdown;
use crate::pipeline::{PatchBoard, RenderContext};
use crate::registry::{BlockProcessor, ProcessorOutput};
use futures::StreamExt;
use std::sync::Arc;
use tracing::error;
use weft_types::CompletionService;

/// Renders `conclusion-reason` fenced blocks
pub struct ConclusionReasonProcessor {
    completion: Arc<dyn CompletionService>,
}

impl ConclusionReasonProcessor {
    /// Processor refining insights through the given completion service
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }
}

/// Card markup around the content node identified by `key`
fn card(key: &str, inner: &str, in_progress: bool) -> String {
    let state = if in_progress { " in-progress" } else { "" };
    format!(
        "<div id=\"wrapper-{key}\" class=\"conclusion-reason{state}\">\
<div class=\"conclusion-reason-icon\">💡</div>\
<div class=\"conclusion-reason-content\"><div id=\"{key}\">{inner}</div></div>\
</div>"
    )
}

fn progress_note(message: &str) -> String {
    format!("<span class=\"thinking-message\"><em>{message}</em></span>")
}

fn next_step_prompt(insight: &str) -> String {
    format!(
        "You are a data analysis assistant.\n\n\
You are given the following data insight:\n\n{insight}\n\n\
Design the best possible next step the user can take to deepen their \
understanding of the data behind this insight. Generalize beyond the \
concrete values where sensible, keep any data references that matter, use \
imperative language, and answer in at most 100 words with no introduction, \
conclusion, or headings."
    )
}

fn summary_prompt(next_step: &str) -> String {
    format!(
        "You are given the following description of a next analysis step:\n\n\
{next_step}\n\n\
Return one short phrase of 10 to 15 words summarising it. Refer to concepts \
in an abstracted way instead of naming concrete data entities."
    )
}

/// Two-stage refinement streamed into the card via the patch board
async fn refine(
    completion: Arc<dyn CompletionService>,
    patches: Arc<PatchBoard>,
    key: String,
    insight: String,
) {
    let wrapper_id = format!("wrapper-{key}");
    patches.set(
        wrapper_id.clone(),
        card(&key, &progress_note("Crafting suggestion..."), true),
    );

    let next_step = match collect_stream(&*completion, &next_step_prompt(&insight)).await {
        Ok(text) => text,
        Err(err) => {
            error!(error = %err, "next-step refinement failed");
            patches.set(
                wrapper_id,
                card(&key, &progress_note("Suggestion unavailable."), false),
            );
            return;
        }
    };

    let mut phrase = String::new();
    let mut stream = match completion.complete_stream(&summary_prompt(&next_step)).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(error = %err, "suggestion summary failed");
            patches.set(
                wrapper_id,
                card(&key, &progress_note("Suggestion unavailable."), false),
            );
            return;
        }
    };

    while let Some(fragment) = stream.next().await {
        phrase.push_str(&fragment);
        patches.set(wrapper_id.clone(), card(&key, &action_markup(&phrase), true));
    }

    patches.set(wrapper_id, card(&key, &action_markup(&phrase), false));
}

fn action_markup(phrase: &str) -> String {
    format!(
        "<span class=\"suggestion-action\">{}</span>",
        render_plain_markdown(phrase)
    )
}

async fn collect_stream(
    completion: &dyn CompletionService,
    prompt: &str,
) -> Result<String, weft_types::CompletionError> {
    let mut stream = completion.complete_stream(prompt).await?;
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment);
    }
    Ok(text)
}

impl BlockProcessor for ConclusionReasonProcessor {
    fn process(
        &self,
        _tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        let key = ctx.node_key().to_string();
        let examining = progress_note("Examining...");

        if ctx.is_streaming() {
            return Ok(ProcessorOutput::Immediate(card(&key, &examining, true)));
        }

        let completion = Arc::clone(&self.completion);
        let patches = ctx.patches();
        let insight = body.to_string();

        Ok(ProcessorOutput::WithFollowup {
            markup: card(&key, &examining, true),
            followup: Box::pin(refine(completion, patches, key, insight)),
        })
    }
}
