//! Suggestion blocks

use crate::error::ProcessorError;
use crate::pipeline::RenderContext;
use crate::registry::{BlockProcessor, ProcessorOutput};

/// Renders `suggestion` fenced blocks as an actionable button
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestionProcessor;

impl BlockProcessor for SuggestionProcessor {
    fn process(
        &self,
        _tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        Ok(ProcessorOutput::Immediate(format!(
            "<button class=\"suggestion-box\">{}</button>",
            ctx.render_nested(body, ctx.is_streaming())
        )))
    }
}
