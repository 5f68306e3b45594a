//! Info-box blocks

use crate::error::ProcessorError;
use crate::pipeline::RenderContext;
use crate::registry::{BlockProcessor, ProcessorOutput};

/// Renders `info` fenced blocks as a highlighted note
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoBoxProcessor;

impl BlockProcessor for InfoBoxProcessor {
    fn process(
        &self,
        _tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        Ok(ProcessorOutput::Immediate(format!(
            "<div class=\"info-box\">{}</div>",
            ctx.render_nested(body, ctx.is_streaming())
        )))
    }
}
