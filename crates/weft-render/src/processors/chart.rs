//! Chart blocks
//!
//! The block body is inline structured data (JSON). The processor emits
//! container markup immediately and schedules a follow-up that hands the
//! parsed spec to the live-surface collaborator, which needs the canvas node
//! to already exist. Drawing itself is outside this crate.

use crate::error::ProcessorError;
use crate::markup::thinking_block;
use crate::pipeline::RenderContext;
use crate::registry::{BlockProcessor, ProcessorOutput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Parsed chart configuration from a block body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart kind ("bar", "pie", ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Chart title
    pub title: String,
    /// One label per data point
    pub labels: Vec<String>,
    /// Data points
    pub data: Vec<f64>,
}

/// Live-surface collaborator that draws charts against an existing canvas
#[async_trait::async_trait]
pub trait ChartSurface: Send + Sync {
    /// Draw a chart on the canvas identified by `canvas_id`
    async fn draw_chart(&self, canvas_id: String, spec: ChartSpec);
}

/// Renders `embedded-chart` fenced blocks
pub struct ChartProcessor {
    surface: Arc<dyn ChartSurface>,
}

impl ChartProcessor {
    /// Processor drawing through the given surface
    #[must_use]
    pub fn new(surface: Arc<dyn ChartSurface>) -> Self {
        Self { surface }
    }
}

impl BlockProcessor for ChartProcessor {
    fn process(
        &self,
        tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        if ctx.is_streaming() {
            return Ok(ProcessorOutput::Immediate(thinking_block(
                "Generating chart...",
            )));
        }

        let spec: ChartSpec = serde_json::from_str(body)
            .map_err(|err| ProcessorError::malformed(tag, err))?;

        let canvas_id = format!("canvas-{}", Uuid::new_v4());
        let height = 50 + spec.labels.len() * 30;
        let markup = format!(
            "<div class=\"chart-container\"><canvas class=\"chart-canvas\" id=\"{canvas_id}\" height=\"{height}\"></canvas></div>"
        );

        let surface = Arc::clone(&self.surface);
        Ok(ProcessorOutput::WithFollowup {
            markup,
            followup: Box::pin(async move {
                surface.draw_chart(canvas_id, spec).await;
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::test_support::{block_message, pipeline_with};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSurface {
        drawn: Mutex<Vec<(String, ChartSpec)>>,
    }

    #[async_trait::async_trait]
    impl ChartSurface for RecordingSurface {
        async fn draw_chart(&self, canvas_id: String, spec: ChartSpec) {
            self.drawn.lock().await.push((canvas_id, spec));
        }
    }

    const BODY: &str =
        r#"{"type":"bar","title":"Walls per storey","labels":["L1","L2"],"data":[12,7]}"#;

    #[test]
    fn streaming_renders_placeholder() {
        let surface = Arc::new(RecordingSurface::default());
        let (pipeline, _store) =
            pipeline_with("embedded-chart", Arc::new(ChartProcessor::new(surface)));
        let message = block_message("embedded-chart", BODY).streaming();
        let markup = pipeline.render(&message, true);
        assert!(markup.contains("Generating chart..."));
    }

    #[tokio::test]
    async fn finished_chart_emits_canvas_and_draws_once() {
        let surface = Arc::new(RecordingSurface::default());
        let (pipeline, _store) = pipeline_with(
            "embedded-chart",
            Arc::new(ChartProcessor::new(Arc::clone(&surface) as Arc<dyn ChartSurface>)),
        );
        let message = block_message("embedded-chart", BODY);

        let markup = pipeline.render(&message, false);
        assert!(markup.contains("chart-container"));
        assert!(markup.contains("height=\"110\""));

        // Cached finished entry: the follow-up is not scheduled again.
        let _ = pipeline.render(&message, false);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let drawn = surface.drawn.lock().await;
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].1.title, "Walls per storey");
    }

    #[test]
    fn malformed_body_renders_inline_error() {
        let surface = Arc::new(RecordingSurface::default());
        let (pipeline, _store) =
            pipeline_with("embedded-chart", Arc::new(ChartProcessor::new(surface)));
        let message = block_message("embedded-chart", "{not json");
        let markup = pipeline.render(&message, false);
        assert!(markup.contains("malformed `embedded-chart` block"));
    }
}
