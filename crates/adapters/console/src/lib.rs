//! # voxhome-adapter-console
//!
//! [`SpeechCapture`] over any line-oriented async reader. Each line is one
//! utterance, lower-cased the way a speech recogniser would hand it over.
//!
//! | Input | Outcome |
//! |-------|---------|
//! | non-blank line | [`ListenOutcome::Text`] |
//! | blank line, or nothing within the listen timeout | [`ListenOutcome::NoInput`] |
//! | line that is not valid UTF-8 | [`ListenOutcome::Unintelligible`] |
//! | read error | [`ListenOutcome::ServiceError`] |
//! | end of input | the exit phrase, as text |
//!
//! ## Dependency rule
//!
//! Depends on `voxhome-app` (port traits) only.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::LinesStream;
use voxhome_app::ports::{ListenOutcome, SpeechCapture, SpeechServiceError};

/// Errors raised while reading utterances.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("failed to read from console")]
    Read(#[source] io::Error),
}

impl From<ConsoleError> for SpeechServiceError {
    fn from(err: ConsoleError) -> Self {
        Self::new(err)
    }
}

/// Line reader acting as the speech capture service.
pub struct ConsoleSpeech<R> {
    lines: Mutex<LinesStream<R>>,
    exit_phrase: String,
}

impl ConsoleSpeech<BufReader<Stdin>> {
    /// Read utterances from the process's standard input.
    pub fn stdin(exit_phrase: impl Into<String>) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), exit_phrase)
    }
}

impl<R: AsyncBufRead + Unpin> ConsoleSpeech<R> {
    /// `exit_phrase` is reported once the reader is exhausted, so the
    /// dispatch loop ends through its normal exit path.
    pub fn new(reader: R, exit_phrase: impl Into<String>) -> Self {
        Self {
            lines: Mutex::new(LinesStream::new(reader.lines())),
            exit_phrase: exit_phrase.into(),
        }
    }
}

impl<R> SpeechCapture for ConsoleSpeech<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn listen(&self, timeout: Duration) -> ListenOutcome {
        let mut lines = self.lines.lock().await;
        let Ok(next) = tokio::time::timeout(timeout, lines.next()).await else {
            return ListenOutcome::NoInput;
        };

        match next {
            Some(Ok(line)) => {
                let utterance = line.trim().to_lowercase();
                if utterance.is_empty() {
                    ListenOutcome::NoInput
                } else {
                    ListenOutcome::Text(utterance)
                }
            }
            Some(Err(err)) if err.kind() == io::ErrorKind::InvalidData => {
                tracing::debug!(%err, "discarding undecodable line");
                ListenOutcome::Unintelligible
            }
            Some(Err(err)) => ListenOutcome::ServiceError(ConsoleError::Read(err).into()),
            None => {
                tracing::debug!("end of input reached");
                ListenOutcome::Text(self.exit_phrase.clone())
            }
        }
    }
}
