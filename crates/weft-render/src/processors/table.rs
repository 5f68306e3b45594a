//! Embedded table blocks
//!
//! The block body is a single-line table reference; the stored payload is
//! markdown table text produced out of band by a query tool.

use crate::error::ProcessorError;
use crate::markup::thinking_block;
use crate::pipeline::RenderContext;
use crate::registry::{BlockProcessor, ProcessorOutput};
use std::str::FromStr;
use weft_reference::{Reference, ReferenceKind};

/// Renders `embedded-table` fenced blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTableProcessor;

impl BlockProcessor for EmbeddedTableProcessor {
    fn process(
        &self,
        _tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        let waiting = || ProcessorOutput::Immediate(thinking_block("Generating table..."));

        let Ok(reference) = Reference::from_str(body.trim()) else {
            return Ok(waiting());
        };
        if reference.kind() != ReferenceKind::Table {
            return Ok(waiting());
        }

        match ctx.store().table(&reference) {
            // Not stored yet: the producer is still running.
            None => Ok(waiting()),
            Some(table_markdown) => Ok(ProcessorOutput::Immediate(
                ctx.render_nested(&format!("\n\n{table_markdown}\n"), false),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::test_support::{block_message, pipeline_with};
    use std::sync::Arc;

    #[test]
    fn missing_table_renders_waiting_placeholder() {
        let (pipeline, _store) = pipeline_with("embedded-table", Arc::new(EmbeddedTableProcessor));
        let message = block_message("embedded-table", "embedded-table-unknown");
        let markup = pipeline.render(&message, true);
        assert!(markup.contains("Generating table..."));
    }

    #[test]
    fn stored_table_renders_markdown_table() {
        let (pipeline, store) = pipeline_with("embedded-table", Arc::new(EmbeddedTableProcessor));
        let reference = store.store_table("| a | b |\n|---|---|\n| 1 | 2 |".to_string());
        let message = block_message("embedded-table", reference.as_str());
        let markup = pipeline.render(&message, false);
        assert!(markup.contains("<table>"));
        assert!(markup.contains("<td>1</td>"));
        assert!(!markup.contains("Generating table..."));
    }

    #[test]
    fn wrong_category_reference_keeps_waiting() {
        let (pipeline, store) = pipeline_with("embedded-table", Arc::new(EmbeddedTableProcessor));
        let reference = store.store_image("ZGF0YQ==".to_string());
        let message = block_message("embedded-table", reference.as_str());
        let markup = pipeline.render(&message, true);
        assert!(markup.contains("Generating table..."));
    }
}
