//! Command: what a user (or a scene) asks a device to do.
//!
//! A [`Command`] is the user-facing vocabulary (`"on"`, `"off"`). A
//! [`Primitive`] is the protocol-level operation a command translates to;
//! the adapter only ever sees primitives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A device command understood by the controller.
///
/// Parsing is case-insensitive and ignores surrounding whitespace. Any other
/// token is rejected with [`ValidationError::UnsupportedCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[non_exhaustive]
pub enum Command {
    On,
    Off,
}

impl Command {
    /// The protocol primitive this command maps to.
    #[must_use]
    pub fn primitive(self) -> Primitive {
        match self {
            Self::On => Primitive::TurnOn,
            Self::Off => Primitive::TurnOff,
        }
    }

    /// The canonical lowercase token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("on") {
            Ok(Self::On)
        } else if token.eq_ignore_ascii_case("off") {
            Ok(Self::Off)
        } else {
            Err(ValidationError::UnsupportedCommand(token.to_string()))
        }
    }
}

impl TryFrom<String> for Command {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Command> for String {
    fn from(value: Command) -> Self {
        value.as_str().to_string()
    }
}

/// Protocol-level operation sent to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    TurnOn,
    TurnOff,
    /// Read the current power state without changing it.
    QueryState,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TurnOn => f.write_str("turn_on"),
            Self::TurnOff => f.write_str("turn_off"),
            Self::QueryState => f.write_str("query_state"),
        }
    }
}
