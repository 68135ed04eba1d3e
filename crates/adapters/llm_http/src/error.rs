//! HTTP interpretation adapter error types.

use voxhome_app::ports::InterpretationServiceError;

/// Errors specific to the completion endpoint client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Transport failure, timeout, or an unreadable body.
    #[error("completion request failed")]
    Request(#[source] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned {status}")]
    Status { status: u16, body: String },

    /// The response carried no completion choice.
    #[error("completion response has no choices")]
    NoChoices,
}

impl From<LlmError> for InterpretationServiceError {
    fn from(err: LlmError) -> Self {
        Self::new(err)
    }
}
