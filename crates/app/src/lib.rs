//! # voxhome-app
//!
//! Application layer: the device control orchestration core and the
//! **port definitions** (traits) for its collaborators.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `ProtocolAdapter`: scan the network, connect to devices, send primitives
//!   - `InterpretationService`: turn a prompt into a completion
//!   - `SpeechCapture`: wait for one utterance
//! - Provide the orchestration core:
//!   - `DeviceRegistry`: concurrency-safe name → device store
//!   - `DiscoveryService`: one-shot and periodic scans merged into the registry
//!   - `DeviceController`: lazy connect + single device commands
//!   - `SceneEngine`: ordered, best-effort scene replay
//!   - `CommandInterpreter`: text → [`Intent`](voxhome_domain::intent::Intent)
//!   - `DispatchLoop`: listen → interpret → act, until the exit phrase
//!
//! ## Dependency rule
//! Depends on `voxhome-domain` only (plus `tokio` for time, sync and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod controller;
pub mod discovery;
pub mod dispatch;
pub mod interpreter;
pub mod ports;
pub mod registry;
pub mod scene_engine;

#[cfg(test)]
pub(crate) mod test_support;
