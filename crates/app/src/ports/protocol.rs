//! Device protocol port: discovery, connection and command primitives.
//!
//! The protocol adapter owns everything wire-level: broadcast discovery,
//! handshakes, encryption. The core only hands it connection parameters and
//! [`Primitive`]s.

use std::future::Future;

use voxhome_domain::command::Primitive;
use voxhome_domain::device::{ConnectionParams, DeviceDescriptor, PowerState};

use super::BoxError;

/// Network-level access to controllable devices.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`).
pub trait ProtocolAdapter: Send + Sync {
    /// Live connection to one device. Owned by the registry record that
    /// opened it and shared with in-flight calls through an `Arc`.
    type Connection: Send + Sync + 'static;

    /// Scan the local network for every reachable device.
    fn scan(&self) -> impl Future<Output = Result<Vec<DeviceDescriptor>, ScanError>> + Send;

    /// Open a connection using the parameters learned by discovery.
    fn connect(
        &self,
        params: &ConnectionParams,
    ) -> impl Future<Output = Result<Self::Connection, ConnectError>> + Send;

    /// Send one primitive over an open connection.
    ///
    /// Turning on a device that is already on must succeed.
    fn send_command(
        &self,
        connection: &Self::Connection,
        primitive: Primitive,
    ) -> impl Future<Output = Result<Ack, CommandError>> + Send;
}

/// Acknowledgement of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ack {
    /// Power state reported with the acknowledgement, when the device sent one.
    pub power: Option<PowerState>,
}

impl Ack {
    #[must_use]
    pub fn with_power(power: PowerState) -> Self {
        Self { power: Some(power) }
    }
}

/// The network scan itself failed.
#[derive(Debug, thiserror::Error)]
#[error("device scan failed: {0}")]
pub struct ScanError(#[source] BoxError);

impl ScanError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self(source.into())
    }
}

/// A connection could not be established.
#[derive(Debug, thiserror::Error)]
#[error("connect failed: {0}")]
pub struct ConnectError(#[source] BoxError);

impl ConnectError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self(source.into())
    }
}

/// The device did not accept or acknowledge a primitive.
#[derive(Debug, thiserror::Error)]
#[error("command failed: {0}")]
pub struct CommandError(#[source] BoxError);

impl CommandError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self(source.into())
    }
}
