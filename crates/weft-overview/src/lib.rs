//! Weft background completion bridge
//!
//! Lets a tool result be a short reference marker embedded inline in the
//! primary token stream while the real content is produced by a slower,
//! multi-stage background computation:
//! - [`OverviewBridge`] fans out per-perspective analyses, aggregates them
//!   through a streamed completion, and writes progress into an overview
//!   entry in the reference store.
//! - [`relay_stream`] watches the primary token stream and, on recognizing a
//!   complete reference marker, switches from raw-token relay to polling the
//!   overview entry until it finishes.
//!
//! The bridge never blocks the tool invocation: the instruction text (with
//! the embedded marker) is returned before the background computation starts.

pub mod bridge;
pub mod prompts;
pub mod relay;

pub use bridge::{OverviewBridge, OverviewError, Perspective, PerspectiveSource, PerspectiveSummary};
pub use relay::relay_stream;
