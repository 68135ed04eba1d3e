//! Natural-language interpretation port.

use std::future::Future;

use super::BoxError;

/// A text-completion service that answers the interpreter's prompt.
pub trait InterpretationService: Send + Sync {
    /// Complete `prompt` and return the raw response text.
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, InterpretationServiceError>> + Send;
}

/// Network, quota or protocol failure of the interpretation service.
#[derive(Debug, thiserror::Error)]
#[error("interpretation service failed: {0}")]
pub struct InterpretationServiceError(#[source] BoxError);

impl InterpretationServiceError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self(source.into())
    }
}
