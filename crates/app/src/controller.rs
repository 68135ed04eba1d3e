//! Device controller: sends one command to one device.
//!
//! The controller looks the device up in the registry, opens a connection on
//! first use, and sends the protocol primitive. Only the lookup and the
//! write-back of a new connection touch the registry lock; connecting and
//! sending happen outside it and are each bounded by a deadline.

use std::sync::Arc;
use std::time::Duration;

use voxhome_domain::command::{Command, Primitive};
use voxhome_domain::device::PowerState;

use crate::ports::{Ack, CommandError, ConnectError, ProtocolAdapter};
use crate::registry::{DeviceRegistry, RegisteredDevice};

/// Why a single device command failed.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("device {0:?} not found")]
    DeviceNotFound(String),

    #[error("unsupported command {0:?}")]
    UnsupportedCommand(String),

    #[error("could not connect to {device}")]
    ConnectionFailed {
        device: String,
        #[source]
        source: ConnectError,
    },

    #[error("{device} failed to {primitive}")]
    DeviceError {
        device: String,
        primitive: Primitive,
        #[source]
        source: CommandError,
    },
}

/// Per-call deadlines applied by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTimeouts {
    pub connect: Duration,
    pub command: Duration,
}

impl Default for ControlTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            command: Duration::from_secs(10),
        }
    }
}

/// Issues on/off/query primitives to devices known to the registry.
pub struct DeviceController<P: ProtocolAdapter> {
    adapter: Arc<P>,
    registry: Arc<DeviceRegistry<P::Connection>>,
    timeouts: ControlTimeouts,
}

impl<P: ProtocolAdapter> DeviceController<P> {
    pub fn new(
        adapter: Arc<P>,
        registry: Arc<DeviceRegistry<P::Connection>>,
        timeouts: ControlTimeouts,
    ) -> Self {
        Self {
            adapter,
            registry,
            timeouts,
        }
    }

    /// Send a raw command token (as spoken) to a device.
    ///
    /// The device is looked up first, then the token is parsed, so an unknown
    /// device is reported before an unknown command. An unsupported token
    /// never reaches the network.
    ///
    /// # Errors
    ///
    /// Any [`ControlError`]; see [`execute`](Self::execute).
    #[tracing::instrument(skip(self))]
    pub async fn control(&self, device_name: &str, command: &str) -> Result<Ack, ControlError> {
        let device = self.lookup(device_name)?;
        let command: Command = command
            .parse()
            .map_err(|_| ControlError::UnsupportedCommand(command.trim().to_string()))?;
        self.send(&device, command.primitive()).await
    }

    /// Send a typed command to a device.
    ///
    /// # Errors
    ///
    /// - [`ControlError::DeviceNotFound`] when the registry has no such
    ///   device; the adapter is not contacted.
    /// - [`ControlError::ConnectionFailed`] when the lazy connect fails or
    ///   times out; the next call retries.
    /// - [`ControlError::DeviceError`] when the device rejects the command or
    ///   does not answer in time; the registry record is kept.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, device_name: &str, command: Command) -> Result<Ack, ControlError> {
        let device = self.lookup(device_name)?;
        self.send(&device, command.primitive()).await
    }

    /// Ask a device for its current power state.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    #[tracing::instrument(skip(self))]
    pub async fn query(&self, device_name: &str) -> Result<PowerState, ControlError> {
        let device = self.lookup(device_name)?;
        let ack = self.send(&device, Primitive::QueryState).await?;
        Ok(ack.power.unwrap_or_default())
    }

    fn lookup(&self, device_name: &str) -> Result<RegisteredDevice<P::Connection>, ControlError> {
        self.registry.get(device_name).ok_or_else(|| {
            tracing::info!(device = device_name, "device not found");
            ControlError::DeviceNotFound(device_name.to_string())
        })
    }

    async fn send(
        &self,
        device: &RegisteredDevice<P::Connection>,
        primitive: Primitive,
    ) -> Result<Ack, ControlError> {
        let name = &device.record.name;
        let connection = self.connection_for(device).await?;

        let result = tokio::time::timeout(
            self.timeouts.command,
            self.adapter.send_command(&connection, primitive),
        )
        .await
        .unwrap_or_else(|elapsed| Err(CommandError::new(elapsed)));

        match result {
            Ok(ack) => {
                tracing::info!(device = %name, %primitive, power = ?ack.power, "device command acknowledged");
                Ok(ack)
            }
            Err(source) => {
                tracing::warn!(device = %name, %primitive, err = %source, "device command failed");
                Err(ControlError::DeviceError {
                    device: name.clone(),
                    primitive,
                    source,
                })
            }
        }
    }

    /// Reuse the record's connection, or open one and store it.
    async fn connection_for(
        &self,
        device: &RegisteredDevice<P::Connection>,
    ) -> Result<Arc<P::Connection>, ControlError> {
        if let Some(connection) = &device.connection {
            return Ok(Arc::clone(connection));
        }

        let name = &device.record.name;
        let params = &device.record.connection;
        tracing::debug!(device = %name, address = %params.address, "connecting to device");

        let connected = tokio::time::timeout(self.timeouts.connect, self.adapter.connect(params))
            .await
            .unwrap_or_else(|elapsed| Err(ConnectError::new(elapsed)));

        match connected {
            Ok(connection) => {
                let connection = Arc::new(connection);
                if !self
                    .registry
                    .attach_connection(name, params, Arc::clone(&connection))
                {
                    tracing::debug!(device = %name, "device changed while connecting, connection not kept");
                }
                Ok(connection)
            }
            Err(source) => {
                tracing::warn!(device = %name, err = %source, "failed to connect to device");
                Err(ControlError::ConnectionFailed {
                    device: name.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, FakeProtocol, descriptor};
    use voxhome_domain::time::now;

    fn controller_with(
        adapter: &Arc<FakeProtocol>,
        names: &[&str],
    ) -> DeviceController<FakeProtocol> {
        let registry = Arc::new(DeviceRegistry::new());
        for (i, name) in names.iter().enumerate() {
            let record = descriptor(name, &format!("10.0.0.{i}"))
                .into_record(now())
                .unwrap();
            registry.upsert(record);
        }
        DeviceController::new(Arc::clone(adapter), registry, ControlTimeouts::default())
    }

    #[tokio::test]
    async fn should_return_not_found_without_contacting_adapter() {
        let adapter = Arc::new(FakeProtocol::default());
        let controller = controller_with(&adapter, &["fan"]);

        let result = controller.control("missing-device", "on").await;

        assert!(matches!(result, Err(ControlError::DeviceNotFound(name)) if name == "missing-device"));
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn should_reject_unsupported_command_without_contacting_device() {
        let adapter = Arc::new(FakeProtocol::default());
        let controller = controller_with(&adapter, &["fan"]);

        let result = controller.control("fan", "dim").await;

        assert!(matches!(result, Err(ControlError::UnsupportedCommand(token)) if token == "dim"));
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn should_connect_lazily_once_and_reuse_connection() {
        let adapter = Arc::new(FakeProtocol::default());
        let controller = controller_with(&adapter, &["Kitchen Outlet"]);

        controller.control("kitchen outlet", "on").await.unwrap();
        controller.control("KITCHEN OUTLET", "OFF").await.unwrap();

        assert_eq!(adapter.connect_count(), 1);
        assert_eq!(
            adapter.sent(),
            [
                ("id-Kitchen Outlet".to_string(), Primitive::TurnOn),
                ("id-Kitchen Outlet".to_string(), Primitive::TurnOff),
            ]
        );
    }

    #[tokio::test]
    async fn should_fail_with_connection_failed_and_retry_next_call() {
        let adapter = Arc::new(FakeProtocol::default());
        adapter.refuse_connect("id-fan");
        let controller = controller_with(&adapter, &["fan"]);

        let first = controller.control("fan", "on").await;
        assert!(matches!(first, Err(ControlError::ConnectionFailed { .. })));
        assert!(controller.registry.get("fan").unwrap().connection.is_none());

        let _ = controller.control("fan", "on").await;
        assert_eq!(adapter.connect_count(), 2);
        assert!(adapter.sent().is_empty());
    }

    #[tokio::test]
    async fn should_keep_record_and_connection_when_device_errors() {
        let adapter = Arc::new(FakeProtocol::default());
        adapter.fail_commands("id-fan");
        let controller = controller_with(&adapter, &["fan"]);

        let result = controller.control("fan", "off").await;

        assert!(matches!(
            result,
            Err(ControlError::DeviceError {
                primitive: Primitive::TurnOff,
                ..
            })
        ));
        let entry = controller.registry.get("fan").unwrap();
        assert!(entry.connection.is_some());
    }

    #[tokio::test]
    async fn should_succeed_when_turning_on_an_already_on_device() {
        let adapter = Arc::new(FakeProtocol::default());
        let controller = controller_with(&adapter, &["fan"]);

        controller.execute("fan", Command::On).await.unwrap();
        let ack = controller.execute("fan", Command::On).await.unwrap();

        assert_eq!(ack.power, Some(PowerState::On));
    }

    #[tokio::test]
    async fn should_query_power_state() {
        let adapter = Arc::new(FakeProtocol::default());
        let controller = controller_with(&adapter, &["fan"]);

        assert_eq!(controller.query("fan").await.unwrap(), PowerState::Unknown);
        controller.execute("fan", Command::Off).await.unwrap();
        assert_eq!(controller.query("fan").await.unwrap(), PowerState::Off);
        assert!(
            adapter
                .calls()
                .contains(&Call::Send("id-fan".to_string(), Primitive::QueryState))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_device_error_when_command_hangs() {
        let adapter = Arc::new(FakeProtocol::default());
        adapter.hang_commands();
        let controller = controller_with(&adapter, &["fan"]);

        let result = controller.execute("fan", Command::On).await;

        assert!(matches!(result, Err(ControlError::DeviceError { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_connection_failed_when_connect_hangs() {
        let adapter = Arc::new(FakeProtocol::default());
        adapter.hang_connect("id-fan");
        let controller = controller_with(&adapter, &["fan"]);

        let result = controller.control("fan", "on").await;

        assert!(matches!(
            result,
            Err(ControlError::ConnectionFailed { ref device, .. }) if device == "fan"
        ));
        assert!(controller.registry.get("fan").unwrap().connection.is_none());
        assert!(adapter.sent().is_empty());
    }
}
