//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the orchestration core and its external
//! collaborators. They are defined here (in `app`) so that both the core and
//! the adapter crates can depend on them without circular dependencies.

pub mod interpretation;
pub mod protocol;
pub mod speech;

pub use interpretation::{InterpretationService, InterpretationServiceError};
pub use protocol::{Ack, CommandError, ConnectError, ProtocolAdapter, ScanError};
pub use speech::{ListenOutcome, SpeechCapture, SpeechServiceError};

/// Boxed error carried as the source of port errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
