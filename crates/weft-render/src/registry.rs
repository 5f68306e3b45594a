//! Block processor registry
//!
//! A fixed-at-startup mapping from a fenced-block tag to the processor that
//! turns that block's body into markup. Registration happens while the
//! registry is still under construction; the pipeline receives it frozen
//! behind an `Arc`.

use crate::error::{ProcessorError, RegistryError};
use crate::pipeline::RenderContext;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Result of processing one fenced block
///
/// The three observed processing shapes form a closed sum: markup now, markup
/// now plus a scheduled side effect, or a placeholder now plus a background
/// task whose result replaces the placeholder node wholesale.
pub enum ProcessorOutput {
    /// Markup returned synchronously
    Immediate(String),

    /// Markup returned synchronously, plus a side-effecting task the pipeline
    /// schedules after the markup has been attached
    WithFollowup {
        /// Markup to attach now
        markup: String,
        /// Task run after attachment (locates its own output node by id)
        followup: BoxFuture<'static, ()>,
    },

    /// Placeholder markup returned now; the task's result replaces the node
    /// identified by `node_id` once resolved
    Deferred {
        /// Id of the placeholder node to replace
        node_id: String,
        /// Placeholder markup to attach now
        placeholder: String,
        /// Background task resolving to the final markup
        task: BoxFuture<'static, String>,
    },
}

impl fmt::Debug for ProcessorOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(markup) => f.debug_tuple("Immediate").field(markup).finish(),
            Self::WithFollowup { markup, .. } => f
                .debug_struct("WithFollowup")
                .field("markup", markup)
                .finish_non_exhaustive(),
            Self::Deferred {
                node_id,
                placeholder,
                ..
            } => f
                .debug_struct("Deferred")
                .field("node_id", node_id)
                .field("placeholder", placeholder)
                .finish_non_exhaustive(),
        }
    }
}

/// Turns a raw fenced-block body into markup
///
/// Processors are pure with respect to the registry; they read and write the
/// reference store through the [`RenderContext`] when they need to stash or
/// fetch heavy payloads.
pub trait BlockProcessor: Send + Sync {
    /// Process one fenced block
    fn process(
        &self,
        tag: &str,
        body: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<ProcessorOutput, ProcessorError>;
}

/// Registry of fenced-block processors
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn BlockProcessor>>,
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("tags", &self.processors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProcessorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor for a tag
    ///
    /// # Errors
    /// Returns [`RegistryError::Duplicate`] if the tag is already taken;
    /// double registration indicates a configuration bug.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        processor: Arc<dyn BlockProcessor>,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();
        if self.processors.contains_key(&tag) {
            return Err(RegistryError::Duplicate(tag));
        }
        self.processors.insert(tag, processor);
        Ok(())
    }

    /// Look up the processor for a tag
    ///
    /// # Errors
    /// Returns [`RegistryError::Unknown`] for unregistered tags.
    pub fn get(&self, tag: &str) -> Result<&Arc<dyn BlockProcessor>, RegistryError> {
        self.processors
            .get(tag)
            .ok_or_else(|| RegistryError::Unknown(tag.to_string()))
    }

    /// Whether a processor is registered for a tag
    #[inline]
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.processors.contains_key(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    struct Echo;

    impl BlockProcessor for Echo {
        fn process(
            &self,
            _tag: &str,
            body: &str,
            _ctx: &RenderContext<'_>,
        ) -> Result<ProcessorOutput, ProcessorError> {
            Ok(ProcessorOutput::Immediate(body.to_string()))
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ProcessorRegistry::new();
        registry.register("echo", Arc::new(Echo)).unwrap();
        assert!(registry.has("echo"));
        assert!(registry.get("echo").is_ok());
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = ProcessorRegistry::new();
        registry.register("echo", Arc::new(Echo)).unwrap();
        let err = registry.register("echo", Arc::new(Echo)).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(tag) if tag == "echo"));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let registry = ProcessorRegistry::new();
        assert!(matches!(
            registry.get("mystery"),
            Err(RegistryError::Unknown(tag)) if tag == "mystery"
        ));
        assert!(!registry.has("mystery"));
    }
}
