//! Intent: the structured meaning of one user utterance.
//!
//! An intent is produced once per utterance, consumed once by the dispatch
//! loop, then discarded. Anything that could not be understood becomes
//! [`Intent::Unrecognized`], so consumers match exhaustively instead of
//! comparing strings.

use std::fmt;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Run a named scene.
    ExecuteScene { scene_name: String },
    /// Send a command to one device. `command` is the raw token; the
    /// controller decides whether it is supported.
    ControlDevice {
        device_name: String,
        command: String,
    },
    /// The utterance could not be turned into an actionable request.
    Unrecognized {
        raw_details: String,
        reason: UnrecognizedReason,
    },
}

impl Intent {
    #[must_use]
    pub fn unrecognized(raw_details: impl Into<String>, reason: UnrecognizedReason) -> Self {
        Self::Unrecognized {
            raw_details: raw_details.into(),
            reason,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecuteScene { scene_name } => write!(f, "execute_scene({scene_name})"),
            Self::ControlDevice {
                device_name,
                command,
            } => write!(f, "control_device({device_name}, {command})"),
            Self::Unrecognized {
                raw_details,
                reason,
            } => write!(f, "unrecognized({reason}: {raw_details:?})"),
        }
    }
}

/// Why an utterance ended up as [`Intent::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnrecognizedReason {
    /// The `Action:` value was not one of the known actions.
    UnknownAction(String),
    /// The action was known but its details could not be split into the
    /// expected parts.
    MalformedIntent,
    /// The interpretation service failed or timed out.
    ServiceError,
    /// The service answered without any `Action:` line.
    EmptyResponse,
}

impl fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAction(action) => write!(f, "unknown action {action:?}"),
            Self::MalformedIntent => f.write_str("malformed intent"),
            Self::ServiceError => f.write_str("interpretation service error"),
            Self::EmptyResponse => f.write_str("empty response"),
        }
    }
}
