//! Built-in block processors
//!
//! Each processor turns one custom fenced-block type into markup. Artifact
//! processors resolve a single-line reference handle through the store and
//! treat "not found" as "still being produced" (waiting placeholder), never
//! as an error.

mod chart;
mod conclusion;
mod image;
mod info;
mod overview;
mod suggestion;
mod table;

pub mod heat_map;

pub use chart::{ChartProcessor, ChartSpec, ChartSurface};
pub use conclusion::ConclusionReasonProcessor;
pub use heat_map::HeatMapProcessor;
pub use image::EmbeddedImageProcessor;
pub use info::InfoBoxProcessor;
pub use overview::OverviewProcessor;
pub use suggestion::SuggestionProcessor;
pub use table::EmbeddedTableProcessor;

use crate::registry::ProcessorRegistry;
use std::sync::Arc;
use weft_types::CompletionService;

/// Reserved tag requesting an embedded long-form report
pub const OVERVIEW_TAG: &str = "embedded-markdown";


/// Registry with every built-in processor registered under its tag
///
/// # Panics
/// Never panics: the built-in tags are distinct by construction.
#[must_use]
pub fn default_registry(
    completion: Arc<dyn CompletionService>,
    surface: Arc<dyn ChartSurface>,
) -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    for (tag, processor) in [
        (
            "embedded-chart",
            Arc::new(ChartProcessor::new(surface)) as Arc<dyn crate::BlockProcessor>,
        ),
        ("suggestion", Arc::new(SuggestionProcessor)),
        ("embedded-table", Arc::new(EmbeddedTableProcessor)),
        ("embedded-image", Arc::new(EmbeddedImageProcessor)),
        ("heat-map", Arc::new(HeatMapProcessor)),
        (OVERVIEW_TAG, Arc::new(OverviewProcessor)),
        (
            "conclusion-reason",
            Arc::new(ConclusionReasonProcessor::new(completion)),
        ),
        ("info", Arc::new(InfoBoxProcessor)),
    ] {
        registry
            .register(tag, processor)
            .unwrap_or_else(|_| unreachable!("built-in tags are distinct"));
    }
    registry
}
