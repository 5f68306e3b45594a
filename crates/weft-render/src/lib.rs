//! Weft render pipeline
//!
//! Turns incrementally arriving chat text into markup with embedded custom
//! artifacts:
//! - A fixed-at-startup [`ProcessorRegistry`] maps fenced-block tags to
//!   [`BlockProcessor`] implementations.
//! - The [`RenderPipeline`] walks the markdown event stream, delegates fenced
//!   blocks to the registry, and memoizes each block's output by content
//!   checksum under a two-phase streaming/finished discipline. The cache is
//!   the only mechanism preventing duplicate side effects: a processor whose
//!   block content has stabilized is never invoked again.
//! - Deferred and follow-up processor results land on a patch board and are
//!   spliced into the markup of subsequent renders.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft_reference::ReferenceStore;
//! use weft_render::{processors, RenderPipeline};
//! use weft_types::{Message, Who};
//!
//! let store = Arc::new(ReferenceStore::new());
//! let registry = processors::default_registry(completion, surface);
//! let pipeline = RenderPipeline::new(Arc::new(registry), Arc::clone(&store));
//!
//! let message = Message::new("m1", "# Hello", Who::System);
//! let markup = pipeline.render(&message, false);
//! ```

pub mod error;
pub mod markup;
pub mod pipeline;
pub mod processors;
pub mod registry;

pub use error::{ProcessorError, RegistryError};
pub use pipeline::{RenderContext, RenderPipeline, RenderedMessage};
pub use registry::{BlockProcessor, ProcessorOutput, ProcessorRegistry};
