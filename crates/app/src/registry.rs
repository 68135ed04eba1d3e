//! Device registry: the concurrency-safe store of known devices.
//!
//! The registry is the only mutable state shared between the discovery loop
//! and the dispatch loop. Every operation takes the lock exactly once and
//! never across an `.await`, so readers always see whole records.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use voxhome_domain::device::{ConnectionParams, DeviceRecord, device_key};

/// A registry entry: the discovered record plus its lazily opened connection.
#[derive(Debug)]
pub struct RegisteredDevice<C> {
    pub record: DeviceRecord,
    /// `None` until the controller first connects, and again after
    /// rediscovery changed the connection parameters.
    pub connection: Option<Arc<C>>,
}

impl<C> Clone for RegisteredDevice<C> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            connection: self.connection.clone(),
        }
    }
}

/// What [`DeviceRegistry::upsert`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// An existing record was replaced. `connection_kept` is `true` when a
    /// live connection survived because the endpoint did not change.
    Updated { connection_kept: bool },
}

/// Name → device map guarded by a read/write lock.
///
/// `C` is the protocol adapter's connection type.
#[derive(Debug)]
pub struct DeviceRegistry<C> {
    devices: RwLock<HashMap<String, RegisteredDevice<C>>>,
}

impl<C> Default for DeviceRegistry<C> {
    fn default() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }
}

impl<C> DeviceRegistry<C> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record keyed by its (case-insensitive) name.
    ///
    /// An existing live connection is carried over only when address, key and
    /// protocol version are unchanged; otherwise it is dropped and the next
    /// command reconnects.
    pub fn upsert(&self, record: DeviceRecord) -> UpsertOutcome {
        merge(&mut self.write(), record)
    }

    /// Apply a batch of records in a single critical section.
    ///
    /// Either every record is merged or, if the caller never gets here,
    /// none is. Outcomes are returned in input order.
    pub fn upsert_all(
        &self,
        records: impl IntoIterator<Item = DeviceRecord>,
    ) -> Vec<UpsertOutcome> {
        let mut devices = self.write();
        records
            .into_iter()
            .map(|record| merge(&mut devices, record))
            .collect()
    }

    /// Case-insensitive lookup. Returns a copy; the lock is released on return.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<RegisteredDevice<C>> {
        self.read().get(&device_key(name)).cloned()
    }

    /// Point-in-time copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RegisteredDevice<C>> {
        self.read().values().cloned().collect()
    }

    /// Store a connection opened for `name`.
    ///
    /// The connection is only kept if the record still carries the endpoint
    /// it was opened with and has no connection yet. Returns whether it was
    /// stored.
    pub fn attach_connection(
        &self,
        name: &str,
        opened_with: &ConnectionParams,
        connection: Arc<C>,
    ) -> bool {
        let mut devices = self.write();
        match devices.get_mut(&device_key(name)) {
            Some(entry)
                if entry.connection.is_none()
                    && entry.record.connection.same_endpoint(opened_with) =>
            {
                entry.connection = Some(connection);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Display names of all known devices, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .values()
            .map(|d| d.record.name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of known devices whose key is not in `seen`.
    pub(crate) fn count_absent_from(&self, seen: &HashSet<String>) -> usize {
        self.snapshot()
            .iter()
            .filter(|d| !seen.contains(&d.record.key()))
            .count()
    }

    // A writer panicking mid-merge cannot leave a torn record behind (records
    // are replaced whole), so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, RegisteredDevice<C>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, RegisteredDevice<C>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn merge<C>(
    devices: &mut HashMap<String, RegisteredDevice<C>>,
    record: DeviceRecord,
) -> UpsertOutcome {
    let key = record.key();
    match devices.get_mut(&key) {
        Some(existing) => {
            let keep = existing.connection.is_some()
                && existing.record.connection.same_endpoint(&record.connection);
            if !keep {
                existing.connection = None;
            }
            existing.record = record;
            UpsertOutcome::Updated {
                connection_kept: keep,
            }
        }
        None => {
            devices.insert(
                key,
                RegisteredDevice {
                    record,
                    connection: None,
                },
            );
            UpsertOutcome::Inserted
        }
    }
}
