//! Command interpreter: free-form text in, [`Intent`] out.
//!
//! The interpreter asks the interpretation service to answer in a two-line
//! `Action:` / `Details:` format and parses that answer tolerantly. It never
//! fails: service errors and malformed answers both become
//! [`Intent::Unrecognized`] with a reason.

use std::time::Duration;

use voxhome_domain::intent::{Intent, UnrecognizedReason};

use crate::ports::{InterpretationService, InterpretationServiceError};

const EXECUTE_SCENE: &str = "Execute Scene";
const CONTROL_DEVICE: &str = "Control Device";

/// Separator between device name and command in `Control Device` details.
const DEVICE_COMMAND_SEPARATOR: &str = " and ";

/// Build the instruction sent to the interpretation service.
#[must_use]
pub fn build_prompt(text: &str) -> String {
    format!(
        "You are a smart home assistant. Interpret the following command:\n\
         Command: {text}\n\
         Respond with the format:\n\
         Action: <{EXECUTE_SCENE} / {CONTROL_DEVICE}>\n\
         Details: <Scene name or device name and action>"
    )
}

/// Parse a raw `Action:` / `Details:` answer.
///
/// Only the first `Action:` line and the first `Details:` line count; every
/// other line is ignored. The action is matched ignoring case.
#[must_use]
pub fn parse_response(raw: &str) -> Intent {
    let mut action = None;
    let mut details = None;
    for line in raw.lines().map(str::trim) {
        if action.is_none()
            && let Some(value) = line.strip_prefix("Action:")
        {
            action = Some(value.trim());
        } else if details.is_none()
            && let Some(value) = line.strip_prefix("Details:")
        {
            details = Some(value.trim());
        }
    }

    let details = details.unwrap_or_default();
    let Some(action) = action else {
        return Intent::unrecognized(details, UnrecognizedReason::EmptyResponse);
    };

    if action.eq_ignore_ascii_case(EXECUTE_SCENE) {
        if details.is_empty() {
            return Intent::unrecognized(details, UnrecognizedReason::MalformedIntent);
        }
        Intent::ExecuteScene {
            scene_name: details.to_string(),
        }
    } else if action.eq_ignore_ascii_case(CONTROL_DEVICE) {
        match split_device_command(details) {
            Some((device_name, command)) => Intent::ControlDevice {
                device_name: device_name.to_string(),
                command: command.to_string(),
            },
            None => Intent::unrecognized(details, UnrecognizedReason::MalformedIntent),
        }
    } else {
        Intent::unrecognized(
            details,
            UnrecognizedReason::UnknownAction(action.to_string()),
        )
    }
}

/// `"<device> and <command>"`, with exactly one separator and both sides
/// non-empty.
fn split_device_command(details: &str) -> Option<(&str, &str)> {
    let mut parts = details.split(DEVICE_COMMAND_SEPARATOR);
    let device = parts.next()?.trim();
    let command = parts.next()?.trim();
    if parts.next().is_some() || device.is_empty() || command.is_empty() {
        return None;
    }
    Some((device, command))
}

/// Turns utterances into intents through an [`InterpretationService`].
pub struct CommandInterpreter<I> {
    service: I,
    timeout: Duration,
}

impl<I: InterpretationService> CommandInterpreter<I> {
    pub fn new(service: I, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    #[must_use]
    pub fn service(&self) -> &I {
        &self.service
    }

    /// Interpret one utterance. Never fails.
    #[tracing::instrument(skip(self))]
    pub async fn interpret(&self, text: &str) -> Intent {
        let prompt = build_prompt(text);
        let response = tokio::time::timeout(self.timeout, self.service.complete(&prompt))
            .await
            .unwrap_or_else(|elapsed| Err(InterpretationServiceError::new(elapsed)));

        let raw = match response {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%err, "interpretation failed");
                return Intent::unrecognized(String::new(), UnrecognizedReason::ServiceError);
            }
        };
        tracing::debug!(response = %raw, "interpretation service answered");

        let intent = parse_response(&raw);
        if let Intent::Unrecognized { reason, .. } = &intent {
            tracing::info!(%reason, "utterance not recognized");
        }
        intent
    }
}
