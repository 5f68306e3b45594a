//! Weft shared types
//!
//! The message model exchanged between the conversation layer and the render
//! pipeline, plus the trait seam toward the external completion service.

pub mod completion;
pub mod message;

pub use completion::{CompletionError, CompletionService, TokenStream};
pub use message::{Message, Who};
