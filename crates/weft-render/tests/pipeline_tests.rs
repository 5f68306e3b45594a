//! Full-pipeline scenarios across the default registry and chunk layer

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use tokio::sync::Mutex;

use weft_chunk::{reconcile, Chunk};
use weft_reference::ReferenceStore;
use weft_render::processors::{self, ChartSpec, ChartSurface};
use weft_render::RenderPipeline;
use weft_types::{CompletionError, CompletionService, Message, TokenStream, Who};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct CannedCompletion(&'static str);

#[async_trait]
impl CompletionService for CannedCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Ok(self.0.to_string())
    }

    async fn complete_stream(&self, _prompt: &str) -> Result<TokenStream, CompletionError> {
        Ok(futures::stream::iter(vec![self.0.to_string()]).boxed())
    }
}

#[derive(Default)]
struct RecordingSurface {
    drawn: Mutex<Vec<(String, ChartSpec)>>,
}

#[async_trait]
impl ChartSurface for RecordingSurface {
    async fn draw_chart(&self, canvas_id: String, spec: ChartSpec) {
        self.drawn.lock().await.push((canvas_id, spec));
    }
}

fn default_pipeline() -> (RenderPipeline, Arc<ReferenceStore>, Arc<RecordingSurface>) {
    let surface = Arc::new(RecordingSurface::default());
    let registry = processors::default_registry(
        Arc::new(CannedCompletion("canned answer")),
        Arc::clone(&surface) as Arc<dyn ChartSurface>,
    );
    let store = Arc::new(ReferenceStore::new());
    (
        RenderPipeline::new(Arc::new(registry), Arc::clone(&store)),
        store,
        surface,
    )
}

#[tokio::test]
async fn table_block_goes_placeholder_then_table_then_sealed() {
    init_tracing();
    let (pipeline, store, _surface) = default_pipeline();

    // The agent emits the fence before the query tool has stored anything;
    // a well-formed handle that resolves to nothing yet.
    let text = "Result:\n\n```embedded-table\nembedded-table-pending\n```".to_string();
    let streaming = Message::new("m1", text, Who::System).streaming();
    let first = pipeline.render(&streaming, true);
    assert!(first.contains("Generating table..."));

    // The tool finishes out of band.
    let reference = store.store_table("| a | b |\n|---|---|\n| 1 | 2 |".to_string());
    let text = format!("Result:\n\n```embedded-table\n{reference}\n```");

    // Streaming ends: the block renders once in finished mode and seals.
    let finished = Message::new("m1", text, Who::System);
    let second = pipeline.render(&finished, false);
    assert!(second.contains("<table>"));
    assert!(second.contains("<td>1</td>"));
    assert!(!second.contains("Generating table..."));

    // Later renders return the sealed markup verbatim.
    let third = pipeline.render(&finished, false);
    assert_eq!(second, third);
}

#[tokio::test]
async fn chart_block_draws_on_surface_exactly_once() {
    let (pipeline, _store, surface) = default_pipeline();

    let body = r#"{"type":"bar","title":"Walls per storey","labels":["L1","L2"],"data":[12,7]}"#;
    let message = Message::new("m1", format!("```embedded-chart\n{body}\n```"), Who::System);

    let markup = pipeline.render(&message, false);
    assert!(markup.contains("chart-canvas"));

    tokio::time::sleep(Duration::from_millis(20)).await;
    // Sealed entry: no second draw command.
    let again = pipeline.render(&message, false);
    assert_eq!(markup, again);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let drawn = surface.drawn.lock().await;
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].1.title, "Walls per storey");
    assert!(markup.contains(&drawn[0].0));
}

#[tokio::test]
async fn heat_map_patch_survives_into_later_renders() {
    init_tracing();
    let (pipeline, store, _surface) = default_pipeline();

    let payload = r#"{"labels":{"x":"Storey","y":"Category","value":"Count"},"values":[{"x":"L1","y":"Walls","value":12.0}]}"#;
    let reference = store.store_heat_map(payload.to_string());
    let message = Message::new(
        "m1",
        format!("```heat-map\n{reference}\n```"),
        Who::System,
    );

    let first = pipeline.render(&message, false);
    assert!(first.contains("deferred-artifact"));

    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = pipeline.render(&message, false);
    assert!(second.contains("heat-map-grid"));
    let third = pipeline.render(&message, false);
    assert_eq!(second, third);
}

#[test]
fn growing_stream_keeps_chunk_ids_stable() {
    let (pipeline, _store, _surface) = default_pipeline();

    let early = Message::new("m1", "First paragraph.", Who::System).streaming();
    let chunks = reconcile(&[], &pipeline.render(&early, true));
    assert_eq!(chunks.len(), 1);
    let first_id = chunks[0].id.clone();

    let later = Message::new(
        "m1",
        "First paragraph.\n\nSecond paragraph, still arriving",
        Who::System,
    )
    .streaming();
    let chunks = reconcile(&chunks, &pipeline.render(&later, true));
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].id, first_id);

    let done = Message::new(
        "m1",
        "First paragraph.\n\nSecond paragraph, still arriving.",
        Who::System,
    );
    let chunks: Vec<Chunk> = reconcile(&chunks, &pipeline.render(&done, false));
    assert_eq!(chunks.len(), 2);
    // The first paragraph's markup never changed, so its id survived.
    assert_eq!(chunks[0].id, first_id);
    assert!(chunks[1].markup.contains("Second paragraph, still arriving."));
}

#[test]
fn info_and_suggestion_blocks_render_inline() {
    let (pipeline, _store, _surface) = default_pipeline();

    let text = "```info\nHeads up.\n```\n\n```suggestion\nShow walls per storey\n```";
    let message = Message::new("m1", text, Who::System);
    let markup = pipeline.render(&message, false);

    assert!(markup.contains("info-box"));
    assert!(markup.contains("suggestion-box"));
    assert!(markup.contains("Show walls per storey"));
}
