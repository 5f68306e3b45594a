//! Weft Reference Store
//!
//! Opaque, category-prefixed handles for passing heavy payloads between
//! processing stages without routing them through model prompts:
//! - Typed references ([`Reference`], [`ReferenceKind`])
//! - In-memory keyed store ([`ReferenceStore`])
//! - Mutable overview entries for background-produced reports ([`OverviewEntry`])
//!
//! A producer stores a payload and embeds the short handle in generated text;
//! consumers resolve the handle later. A missing handle is not an error: for
//! asynchronously produced categories it means "still being produced".
//!
//! # Example
//!
//! ```rust
//! use weft_reference::ReferenceStore;
//!
//! let store = ReferenceStore::new();
//! let reference = store.store_table("| a | b |\n|---|---|\n| 1 | 2 |".to_string());
//! assert!(store.table(&reference).is_some());
//! ```

pub mod reference;
pub mod store;

pub use reference::{Reference, ReferenceError, ReferenceKind};
pub use store::{OverviewEntry, ReferenceStore};
