//! # voxhome-adapter-virtual
//!
//! Simulated [`ProtocolAdapter`] for demos and tests. Every configured
//! outlet answers scans, checks its key on connect and keeps an in-memory
//! relay state.
//!
//! ## Default outlets
//!
//! | Name | Id | Address |
//! |------|----|---------|
//! | Living Room Light | `vx-living-room-light` | `10.0.0.11` |
//! | Kitchen Outlet | `vx-kitchen-outlet` | `10.0.0.12` |
//! | Office Light | `vx-office-light` | `10.0.0.13` |
//! | Fan | `vx-fan` | `10.0.0.14` |
//!
//! An outlet marked unreachable disappears from scans and refuses
//! connections and commands.
//!
//! ## Dependency rule
//!
//! Depends on `voxhome-app` (port traits) and `voxhome-domain` only.

mod error;
mod outlet;

use std::sync::Arc;

use uuid::Uuid;
use voxhome_app::ports::{Ack, CommandError, ConnectError, ProtocolAdapter, ScanError};
use voxhome_domain::command::Primitive;
use voxhome_domain::device::{ConnectionParams, DeviceDescriptor};

pub use error::VirtualError;
pub use outlet::{OutletSpec, VirtualOutlet};

/// An open session with one virtual outlet.
#[derive(Debug)]
pub struct VirtualSession {
    session_id: Uuid,
    outlet: Arc<VirtualOutlet>,
}

impl VirtualSession {
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Protocol adapter backed by simulated outlets.
#[derive(Debug)]
pub struct VirtualProtocol {
    outlets: Vec<Arc<VirtualOutlet>>,
}

impl Default for VirtualProtocol {
    fn default() -> Self {
        Self::new([
            OutletSpec::new("Living Room Light", "vx-living-room-light", "10.0.0.11", "lr-key"),
            OutletSpec::new("Kitchen Outlet", "vx-kitchen-outlet", "10.0.0.12", "ko-key"),
            OutletSpec::new("Office Light", "vx-office-light", "10.0.0.13", "ol-key"),
            OutletSpec::new("Fan", "vx-fan", "10.0.0.14", "fan-key"),
        ])
    }
}

impl VirtualProtocol {
    pub fn new(specs: impl IntoIterator<Item = OutletSpec>) -> Self {
        Self {
            outlets: specs
                .into_iter()
                .map(|spec| Arc::new(VirtualOutlet::new(spec)))
                .collect(),
        }
    }

    /// Look an outlet up by its protocol id.
    #[must_use]
    pub fn outlet(&self, id: &str) -> Option<&Arc<VirtualOutlet>> {
        self.outlets.iter().find(|o| o.spec().id == id)
    }

    #[must_use]
    pub fn outlets(&self) -> &[Arc<VirtualOutlet>] {
        &self.outlets
    }

    fn open(&self, params: &ConnectionParams) -> Result<VirtualSession, VirtualError> {
        let outlet = self
            .outlet(&params.device_id)
            .ok_or_else(|| VirtualError::UnknownDevice(params.device_id.clone()))?;
        let spec = outlet.spec();
        if !outlet.is_reachable() {
            return Err(VirtualError::Unreachable(spec.id.clone()));
        }
        if spec.address != params.address {
            return Err(VirtualError::AddressMismatch(
                spec.id.clone(),
                params.address.clone(),
            ));
        }
        if spec.key != params.auth_key {
            return Err(VirtualError::KeyMismatch(spec.id.clone()));
        }
        Ok(VirtualSession {
            session_id: Uuid::new_v4(),
            outlet: Arc::clone(outlet),
        })
    }
}

impl ProtocolAdapter for VirtualProtocol {
    type Connection = VirtualSession;

    async fn scan(&self) -> Result<Vec<DeviceDescriptor>, ScanError> {
        let found: Vec<DeviceDescriptor> = self
            .outlets
            .iter()
            .filter(|o| o.is_reachable())
            .map(|o| o.descriptor())
            .collect();
        tracing::debug!(count = found.len(), "virtual scan answered");
        Ok(found)
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<VirtualSession, ConnectError> {
        let session = self.open(params).map_err(ConnectError::new)?;
        tracing::debug!(
            device_id = %params.device_id,
            session_id = %session.session_id,
            "virtual session opened"
        );
        Ok(session)
    }

    async fn send_command(
        &self,
        connection: &VirtualSession,
        primitive: Primitive,
    ) -> Result<Ack, CommandError> {
        let outlet = &connection.outlet;
        if !outlet.is_reachable() {
            return Err(CommandError::new(VirtualError::Unreachable(
                outlet.spec().id.clone(),
            )));
        }
        let power = outlet.apply(primitive);
        tracing::debug!(device_id = %outlet.spec().id, %primitive, %power, "virtual outlet switched");
        Ok(Ack::with_power(power))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxhome_domain::device::PowerState;
    use voxhome_domain::time::now;

    fn params_for(protocol: &VirtualProtocol, id: &str) -> ConnectionParams {
        protocol
            .outlet(id)
            .unwrap()
            .descriptor()
            .into_record(now())
            .unwrap()
            .connection
    }

    #[tokio::test]
    async fn should_scan_every_default_outlet() {
        let protocol = VirtualProtocol::default();
        let found = protocol.scan().await.unwrap();
        let names: Vec<&str> = found.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["Living Room Light", "Kitchen Outlet", "Office Light", "Fan"]
        );
    }

    #[tokio::test]
    async fn should_hide_unreachable_outlets_from_scan() {
        let protocol = VirtualProtocol::default();
        protocol.outlet("vx-fan").unwrap().set_reachable(false);
        let found = protocol.scan().await.unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|d| d.id != "vx-fan"));
    }

    #[tokio::test]
    async fn should_connect_and_switch_outlet() {
        let protocol = VirtualProtocol::default();
        let session = protocol
            .connect(&params_for(&protocol, "vx-kitchen-outlet"))
            .await
            .unwrap();

        let ack = protocol
            .send_command(&session, Primitive::TurnOn)
            .await
            .unwrap();

        assert_eq!(ack.power, Some(PowerState::On));
        assert_eq!(
            protocol.outlet("vx-kitchen-outlet").unwrap().power(),
            PowerState::On
        );
    }

    #[tokio::test]
    async fn should_open_distinct_sessions() {
        let protocol = VirtualProtocol::default();
        let params = params_for(&protocol, "vx-fan");
        let a = protocol.connect(&params).await.unwrap();
        let b = protocol.connect(&params).await.unwrap();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[tokio::test]
    async fn should_refuse_connect_when_key_is_wrong() {
        let protocol = VirtualProtocol::default();
        let mut params = params_for(&protocol, "vx-fan");
        params.auth_key = "guess".to_string();
        assert!(protocol.connect(&params).await.is_err());
    }

    #[tokio::test]
    async fn should_refuse_connect_when_device_is_unknown() {
        let protocol = VirtualProtocol::default();
        let mut params = params_for(&protocol, "vx-fan");
        params.device_id = "vx-toaster".to_string();
        let err = protocol.connect(&params).await.unwrap_err();
        assert!(err.to_string().contains("connect failed"));
    }

    #[tokio::test]
    async fn should_fail_command_when_outlet_becomes_unreachable() {
        let protocol = VirtualProtocol::default();
        let session = protocol
            .connect(&params_for(&protocol, "vx-fan"))
            .await
            .unwrap();
        protocol.outlet("vx-fan").unwrap().set_reachable(false);

        let result = protocol.send_command(&session, Primitive::TurnOn).await;

        assert!(result.is_err());
        assert_eq!(protocol.outlet("vx-fan").unwrap().power(), PowerState::Off);
    }
}
