//! Embedded image blocks
//!
//! The block body is a single-line image reference; the payload is a base64
//! image stored by a snapshot tool. While the message streams, the image may
//! legitimately not exist yet; once the message is finished, a missing
//! payload is a real failure and renders inline error text.

use crate::error::ProcessorError;
use crate::markup::{escape_html, inline_error, thinking_block};
use crate::pipeline::RenderContext;
use crate::registry::{BlockProcessor, ProcessorOutput};
use std::str::FromStr;
use weft_reference::{Reference, ReferenceKind};

/// Renders `embedded-image` fenced blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImageProcessor;

impl BlockProcessor for EmbeddedImageProcessor {
    fn process(
        &self,
        _tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        if ctx.is_streaming() {
            return Ok(ProcessorOutput::Immediate(thinking_block(
                "Generating image...",
            )));
        }

        let payload = Reference::from_str(body.trim())
            .ok()
            .filter(|reference| reference.kind() == ReferenceKind::Image)
            .and_then(|reference| ctx.store().image(&reference));

        match payload {
            None => Ok(ProcessorOutput::Immediate(inline_error(
                "An error occurred while generating the image.",
            ))),
            Some(base64_image) => Ok(ProcessorOutput::Immediate(format!(
                "<img class=\"embedded-image\" data-image-id=\"{}\" src=\"{}\">",
                escape_html(body.trim()),
                escape_html(&base64_image)
            ))),
        }
    }
}
