//! Speech capture port.

use std::future::Future;
use std::time::Duration;

use super::BoxError;

/// Source of user utterances, already converted to text.
pub trait SpeechCapture: Send + Sync {
    /// Wait up to `timeout` for one utterance.
    fn listen(&self, timeout: Duration) -> impl Future<Output = ListenOutcome> + Send;
}

/// Result of one listening attempt. Only [`Text`](Self::Text) proceeds to
/// interpretation.
#[derive(Debug)]
pub enum ListenOutcome {
    Text(String),
    /// Nothing was said before the timeout.
    NoInput,
    /// Something was heard but could not be transcribed.
    Unintelligible,
    ServiceError(SpeechServiceError),
}

/// The speech service failed (device, network, quota).
#[derive(Debug, thiserror::Error)]
#[error("speech service failed: {0}")]
pub struct SpeechServiceError(#[source] BoxError);

impl SpeechServiceError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self(source.into())
    }
}
