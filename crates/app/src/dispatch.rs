//! Dispatch loop: listen, interpret, act, repeat.
//!
//! One utterance is handled at a time. Every cycle ends back in
//! [`DispatchState::Idle`] whatever went wrong, except the exit phrase which
//! moves the loop to [`DispatchState::Stopped`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use voxhome_domain::id::UtteranceId;
use voxhome_domain::intent::{Intent, UnrecognizedReason};

use crate::controller::{ControlError, DeviceController};
use crate::interpreter::CommandInterpreter;
use crate::ports::{
    Ack, InterpretationService, ListenOutcome, ProtocolAdapter, SpeechCapture, SpeechServiceError,
};
use crate::scene_engine::{SceneEngine, SceneError, SceneReport};

/// Where the loop currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Listening,
    Interpreting,
    Acting,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// How long one listen call may wait for speech.
    pub listen_timeout: Duration,
    /// Utterance that stops the loop, compared trimmed and ignoring case.
    pub exit_phrase: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            listen_timeout: Duration::from_secs(5),
            exit_phrase: "exit".to_string(),
        }
    }
}

/// What one cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    NoInput,
    Unintelligible,
    ListenFailed(SpeechServiceError),
    Exit,
    Unrecognized {
        raw_details: String,
        reason: UnrecognizedReason,
    },
    Scene(Result<SceneReport, SceneError>),
    Device(Result<Ack, ControlError>),
}

/// Totals returned by [`DispatchLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    /// `true` when the exit phrase ended the loop, `false` on shutdown.
    pub exited: bool,
}

/// Foreground loop routing utterances to scenes and devices.
pub struct DispatchLoop<S, I, P: ProtocolAdapter> {
    speech: S,
    interpreter: CommandInterpreter<I>,
    scenes: SceneEngine<P>,
    controller: Arc<DeviceController<P>>,
    settings: DispatchSettings,
    state: DispatchState,
}

impl<S, I, P> DispatchLoop<S, I, P>
where
    S: SpeechCapture,
    I: InterpretationService,
    P: ProtocolAdapter,
{
    pub fn new(
        speech: S,
        interpreter: CommandInterpreter<I>,
        scenes: SceneEngine<P>,
        controller: Arc<DeviceController<P>>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            speech,
            interpreter,
            scenes,
            controller,
            settings,
            state: DispatchState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    fn is_exit_phrase(&self, text: &str) -> bool {
        text.trim()
            .eq_ignore_ascii_case(self.settings.exit_phrase.trim())
    }

    /// Handle exactly one utterance.
    ///
    /// Calling `step` after the loop stopped does nothing and reports
    /// [`CycleOutcome::Exit`] again.
    #[tracing::instrument(skip(self), fields(utterance_id = %UtteranceId::new()))]
    pub async fn step(&mut self) -> CycleOutcome {
        if self.state == DispatchState::Stopped {
            return CycleOutcome::Exit;
        }

        self.state = DispatchState::Listening;
        let text = match self.speech.listen(self.settings.listen_timeout).await {
            ListenOutcome::Text(text) if !text.trim().is_empty() => text,
            ListenOutcome::Text(_) | ListenOutcome::NoInput => {
                self.state = DispatchState::Idle;
                return CycleOutcome::NoInput;
            }
            ListenOutcome::Unintelligible => {
                tracing::info!("could not understand the utterance");
                self.state = DispatchState::Idle;
                return CycleOutcome::Unintelligible;
            }
            ListenOutcome::ServiceError(err) => {
                tracing::warn!(%err, "speech capture failed");
                self.state = DispatchState::Idle;
                return CycleOutcome::ListenFailed(err);
            }
        };

        if self.is_exit_phrase(&text) {
            tracing::info!("exit phrase heard, stopping");
            self.state = DispatchState::Stopped;
            return CycleOutcome::Exit;
        }

        tracing::info!(%text, "heard utterance");
        self.state = DispatchState::Interpreting;
        let intent = self.interpreter.interpret(&text).await;

        self.state = DispatchState::Acting;
        let outcome = match intent {
            Intent::ExecuteScene { scene_name } => {
                CycleOutcome::Scene(self.scenes.execute(&scene_name).await)
            }
            Intent::ControlDevice {
                device_name,
                command,
            } => CycleOutcome::Device(self.controller.control(&device_name, &command).await),
            Intent::Unrecognized {
                raw_details,
                reason,
            } => CycleOutcome::Unrecognized {
                raw_details,
                reason,
            },
        };
        self.state = DispatchState::Idle;
        outcome
    }

    /// Run cycles until the exit phrase is heard or `shutdown` is cancelled.
    ///
    /// Cancellation abandons the cycle in progress.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> RunSummary {
        let mut summary = RunSummary {
            cycles: 0,
            exited: false,
        };
        tracing::info!(exit_phrase = %self.settings.exit_phrase, "dispatch loop started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    tracing::info!("shutdown requested, leaving dispatch loop");
                    break;
                }
                outcome = self.step() => {
                    summary.cycles += 1;
                    if matches!(outcome, CycleOutcome::Exit) {
                        summary.exited = true;
                        break;
                    }
                }
            }
        }

        self.state = DispatchState::Stopped;
        tracing::info!(cycles = summary.cycles, exited = summary.exited, "dispatch loop stopped");
        summary
    }
}
