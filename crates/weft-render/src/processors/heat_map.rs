//! Heat-map blocks
//!
//! The block body is a single-line heat-map reference whose stored payload is
//! serialized cell data. Producing the grid markup happens off the render
//! path: the processor returns a placeholder immediately and a background
//! task that resolves to the final markup, which the pipeline splices in
//! wholesale on later renders.

use crate::error::ProcessorError;
use crate::markup::{escape_html, inline_error, thinking_block};
use crate::pipeline::RenderContext;
use crate::registry::{BlockProcessor, ProcessorOutput};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use weft_reference::{Reference, ReferenceKind};

/// Axis labels of a heat map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatMapLabels {
    /// Horizontal axis label
    pub x: String,
    /// Vertical axis label
    pub y: String,
    /// Value label
    pub value: String,
}

/// One cell of a heat map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatMapCell {
    /// Horizontal coordinate
    pub x: String,
    /// Vertical coordinate
    pub y: String,
    /// Cell value
    pub value: f64,
}

/// Stored heat-map payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatMapPayload {
    /// Axis labels
    pub labels: HeatMapLabels,
    /// Cells in row-major order
    pub values: Vec<HeatMapCell>,
}

/// Renders `heat-map` fenced blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatMapProcessor;

/// Build the resolved grid markup from a parsed payload
fn grid_markup(payload: &HeatMapPayload) -> String {
    let mut rows: Vec<&str> = payload.values.iter().map(|cell| cell.y.as_str()).collect();
    rows.sort_unstable();
    rows.dedup();
    let mut columns: Vec<&str> = payload.values.iter().map(|cell| cell.x.as_str()).collect();
    columns.sort_unstable();
    columns.dedup();

    let max = payload
        .values
        .iter()
        .map(|cell| cell.value)
        .fold(f64::MIN, f64::max);

    let mut out = String::from("<div class=\"heat-map\"><table class=\"heat-map-grid\">");
    out.push_str("<thead><tr><th></th>");
    for column in &columns {
        out.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    out.push_str("</tr></thead><tbody>");

    for row in rows {
        out.push_str(&format!("<tr><th>{}</th>", escape_html(row)));
        for column in &columns {
            let cell = payload
                .values
                .iter()
                .find(|cell| cell.y == row && cell.x == *column);
            match cell {
                Some(cell) => {
                    let intensity = if max > 0.0 { cell.value / max } else { 0.0 };
                    out.push_str(&format!(
                        "<td class=\"heat-cell\" data-intensity=\"{intensity:.3}\" title=\"{}: {}\">{}</td>",
                        escape_html(&payload.labels.value),
                        cell.value,
                        cell.value
                    ));
                }
                None => out.push_str("<td class=\"heat-cell empty\"></td>"),
            }
        }
        out.push_str("</tr>");
    }

    out.push_str("</tbody></table></div>");
    out
}

impl BlockProcessor for HeatMapProcessor {
    fn process(
        &self,
        tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError> {
        let waiting = || ProcessorOutput::Immediate(thinking_block("Generating chart..."));

        if ctx.is_streaming() {
            return Ok(waiting());
        }

        let payload = Reference::from_str(body.trim())
            .ok()
            .filter(|reference| reference.kind() == ReferenceKind::HeatMap)
            .and_then(|reference| ctx.store().heat_map(&reference));

        let Some(raw) = payload else {
            return Ok(waiting());
        };

        let node_id = format!("deferred-{}", ctx.node_key());
        let placeholder = format!("<div id=\"{node_id}\" class=\"deferred-artifact\"></div>");
        let tag = tag.to_string();

        Ok(ProcessorOutput::Deferred {
            node_id,
            placeholder,
            task: Box::pin(async move {
                match serde_json::from_str::<HeatMapPayload>(&raw) {
                    Ok(payload) => grid_markup(&payload),
                    Err(err) => {
                        tracing::warn!(tag = %tag, error = %err, "malformed heat-map payload");
                        inline_error("The heat map data could not be read.")
                    }
                }
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::test_support::{block_message, pipeline_with};
    use std::sync::Arc;
    use std::time::Duration;

    fn payload_json() -> String {
        serde_json::to_string(&HeatMapPayload {
            labels: HeatMapLabels {
                x: "Storey".to_string(),
                y: "Category".to_string(),
                value: "Count".to_string(),
            },
            values: vec![
                HeatMapCell {
                    x: "L1".to_string(),
                    y: "Walls".to_string(),
                    value: 12.0,
                },
                HeatMapCell {
                    x: "L2".to_string(),
                    y: "Walls".to_string(),
                    value: 3.0,
                },
            ],
        })
        .unwrap()
    }

    #[test]
    fn streaming_and_missing_payload_render_placeholder() {
        let (pipeline, _store) = pipeline_with("heat-map", Arc::new(HeatMapProcessor));

        let message = block_message("heat-map", "heat-map-pending").streaming();
        assert!(pipeline.render(&message, true).contains("Generating chart..."));

        let message = block_message("heat-map", "heat-map-pending");
        assert!(pipeline
            .render(&message, false)
            .contains("Generating chart..."));
    }

    #[tokio::test]
    async fn resolved_payload_replaces_placeholder_on_rerender() {
        let (pipeline, store) = pipeline_with("heat-map", Arc::new(HeatMapProcessor));
        let reference = store.store_heat_map(payload_json());
        let message = block_message("heat-map", reference.as_str());

        let first = pipeline.render(&message, false);
        assert!(first.contains("deferred-artifact"));

        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = pipeline.render(&message, false);
        assert!(second.contains("heat-map-grid"));
        assert!(second.contains("<th>L1</th>"));
        assert!(!second.contains("deferred-artifact"));
    }

    #[tokio::test]
    async fn malformed_payload_resolves_to_inline_error() {
        let (pipeline, store) = pipeline_with("heat-map", Arc::new(HeatMapProcessor));
        let reference = store.store_heat_map("{broken".to_string());
        let message = block_message("heat-map", reference.as_str());

        let _ = pipeline.render(&message, false);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let markup = pipeline.render(&message, false);
        assert!(markup.contains("The heat map data could not be read."));
    }

    #[test]
    fn ungrouped_cells_emit_each_row_once() {
        let payload = HeatMapPayload {
            labels: HeatMapLabels {
                x: "Storey".to_string(),
                y: "Category".to_string(),
                value: "Count".to_string(),
            },
            // Cells interleaved across rows, not grouped by y.
            values: vec![
                HeatMapCell {
                    x: "L1".to_string(),
                    y: "Walls".to_string(),
                    value: 12.0,
                },
                HeatMapCell {
                    x: "L1".to_string(),
                    y: "Doors".to_string(),
                    value: 4.0,
                },
                HeatMapCell {
                    x: "L2".to_string(),
                    y: "Walls".to_string(),
                    value: 3.0,
                },
            ],
        };
        let markup = grid_markup(&payload);
        assert_eq!(markup.matches("<th>Walls</th>").count(), 1);
        assert_eq!(markup.matches("<th>Doors</th>").count(), 1);
        // Three populated cells, one empty slot in the 2x2 grid.
        assert_eq!(markup.matches("heat-cell empty").count(), 1);
    }

    #[test]
    fn grid_markup_contains_all_cells() {
        let payload: HeatMapPayload = serde_json::from_str(&payload_json()).unwrap();
        let markup = grid_markup(&payload);
        assert!(markup.contains("<th>Walls</th>"));
        assert!(markup.contains("data-intensity=\"1.000\""));
        assert!(markup.contains("data-intensity=\"0.250\""));
    }
}
