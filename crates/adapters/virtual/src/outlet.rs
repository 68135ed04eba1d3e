//! Virtual outlet: a simulated smart plug with an on/off relay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use voxhome_domain::command::Primitive;
use voxhome_domain::device::{DeviceDescriptor, PowerState};

/// How a simulated outlet presents itself on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletSpec {
    pub name: String,
    pub id: String,
    pub address: String,
    pub key: String,
    /// Reported protocol version. Left out of scans when `None`.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_initial_state")]
    pub initial_state: PowerState,
}

fn default_initial_state() -> PowerState {
    PowerState::Off
}

impl OutletSpec {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        address: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            address: address.into(),
            key: key.into(),
            version: Some("3.3".to_string()),
            initial_state: PowerState::Off,
        }
    }
}

/// A simulated outlet holding its relay state.
#[derive(Debug)]
pub struct VirtualOutlet {
    spec: OutletSpec,
    power: Mutex<PowerState>,
    reachable: AtomicBool,
}

impl VirtualOutlet {
    #[must_use]
    pub fn new(spec: OutletSpec) -> Self {
        Self {
            power: Mutex::new(spec.initial_state),
            reachable: AtomicBool::new(true),
            spec,
        }
    }

    #[must_use]
    pub fn spec(&self) -> &OutletSpec {
        &self.spec
    }

    /// What a network scan reports for this outlet.
    #[must_use]
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            name: self.spec.name.clone(),
            id: self.spec.id.clone(),
            address: Some(self.spec.address.clone()),
            key: Some(self.spec.key.clone()),
            version: self.spec.version.clone(),
        }
    }

    #[must_use]
    pub fn power(&self) -> PowerState {
        *self.lock_power()
    }

    /// Apply a primitive and return the resulting relay state.
    pub fn apply(&self, primitive: Primitive) -> PowerState {
        let mut power = self.lock_power();
        match primitive {
            Primitive::TurnOn => *power = PowerState::On,
            Primitive::TurnOff => *power = PowerState::Off,
            Primitive::QueryState => {}
        }
        *power
    }

    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn lock_power(&self) -> MutexGuard<'_, PowerState> {
        self.power.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
