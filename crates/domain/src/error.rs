//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`VoxHomeError`] via `#[from]` where it crosses into domain territory.

/// Top-level domain error.
#[derive(Debug, thiserror::Error)]
pub enum VoxHomeError {
    #[error("validation error")]
    Validation(#[from] ValidationError),
}

/// A domain invariant was violated while building a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("scene must contain at least one action")]
    NoActions,

    #[error("scene {0:?} is defined more than once")]
    DuplicateScene(String),

    #[error("unsupported command {0:?}")]
    UnsupportedCommand(String),
}
