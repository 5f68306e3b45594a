//! Completion-service seam
//!
//! The completion service is an external collaborator: given a prompt it
//! returns text, either as a single result or as an incremental sequence of
//! fragments. No further contract is assumed about model or determinism.

use futures::stream::BoxStream;

/// Incremental sequence of text fragments from a running completion
pub type TokenStream = BoxStream<'static, String>;

/// Errors surfaced by the completion service
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The service rejected or failed the request
    #[error("completion request failed: {0}")]
    RequestFailed(String),

    /// The service dropped an in-flight stream
    #[error("completion stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// External text-generation collaborator
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Run a prompt to completion and return the full text
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Run a prompt and return its output incrementally
    async fn complete_stream(&self, prompt: &str) -> Result<TokenStream, CompletionError>;
}
