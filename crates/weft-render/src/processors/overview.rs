//! Embedded long-form report blocks
//!
//! The reserved `embedded-markdown` block carries a single-line overview
//! reference produced by the background completion bridge. While the message
//! streams, or while no entry is resolvable, the block renders as nothing:
//! the stream relay owns the user-visible progress in those phases.

use crate::error::ProcessorError;
use crate::pipeline::RenderContext;
use crate::registry::{BlockProcessor, ProcessorOutput};
use std::str::FromStr;
use weft_reference::{Reference, ReferenceKind};

/// Renders `embedded-markdown` fenced blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewProcessor;

impl BlockProcessor for OverviewProcessor {
    fn process(
        &self,
        _tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        if ctx.is_streaming() {
            return Ok(ProcessorOutput::Immediate(String::new()));
        }

        let entry = Reference::from_str(body.trim())
            .ok()
            .filter(|reference| reference.kind() == ReferenceKind::Overview)
            .and_then(|reference| ctx.store().overview(&reference));

        match entry {
            None => Ok(ProcessorOutput::Immediate(String::new())),
            Some(entry) => Ok(ProcessorOutput::Immediate(
                ctx.render_nested(&entry.text, false),
            )),
        }
    }
}
