//! Error types for the render pipeline
//!
//! Registry failures are configuration bugs and surface as hard errors.
//! Processor failures are runtime conditions and are rendered inline as
//! human-readable text, never propagated to the rest of the pipeline.

/// Registry configuration errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A processor is already registered for this tag
    #[error("processor for tag `{0}` already registered")]
    Duplicate(String),

    /// No processor registered for this tag
    #[error("no processor registered for tag `{0}`")]
    Unknown(String),
}

/// Block-processor runtime errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// The block body could not be parsed as the expected structured data
    #[error("malformed `{tag}` block: {reason}")]
    MalformedBody {
        /// Fenced-block tag
        tag: String,
        /// Human-readable parse failure
        reason: String,
    },
}

impl ProcessorError {
    /// Malformed-body error from any displayable cause
    #[must_use]
    pub fn malformed(tag: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedBody {
            tag: tag.into(),
            reason: reason.to_string(),
        }
    }
}
