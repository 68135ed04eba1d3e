//! Discovery service: scans the network and merges what it finds into the
//! registry.
//!
//! A failed scan never removes anything: devices that disappear from the
//! network stay in the registry and simply fail when controlled. At most one
//! scan runs at a time; a scan that is cancelled before its merge leaves the
//! registry untouched, because the merge happens in one critical section
//! after the scan returns.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use voxhome_domain::device::DeviceDescriptor;
use voxhome_domain::id::ScanId;
use voxhome_domain::time::now;

use crate::ports::{ProtocolAdapter, ScanError};
use crate::registry::{DeviceRegistry, UpsertOutcome};

/// Why a discovery pass merged nothing.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("device scan timed out after {0:?}")]
    TimedOut(Duration),

    #[error("a device scan is already in flight")]
    AlreadyRunning,
}

/// Summary of one merged scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Usable descriptors returned by the scan.
    pub discovered: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Updated records left without a live connection; their next command
    /// connects first.
    pub reconnect_required: usize,
    /// Descriptors missing a name, address or key.
    pub dropped_incomplete: usize,
    /// Known devices the scan did not report (kept as they are).
    pub stale: usize,
}

/// Runs scans through a [`ProtocolAdapter`] and merges results into the
/// shared [`DeviceRegistry`].
pub struct DiscoveryService<P: ProtocolAdapter> {
    adapter: Arc<P>,
    registry: Arc<DeviceRegistry<P::Connection>>,
    scan_timeout: Duration,
    in_flight: Mutex<()>,
}

impl<P: ProtocolAdapter> DiscoveryService<P> {
    /// Create a new service. `scan_timeout` bounds a single scan.
    pub fn new(
        adapter: Arc<P>,
        registry: Arc<DeviceRegistry<P::Connection>>,
        scan_timeout: Duration,
    ) -> Self {
        Self {
            adapter,
            registry,
            scan_timeout,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one scan and merge its results.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::AlreadyRunning`] when another scan is in flight
    ///   (this call does not wait for it).
    /// - [`DiscoveryError::Scan`] / [`DiscoveryError::TimedOut`] when the
    ///   adapter fails; the registry is left exactly as it was.
    #[tracing::instrument(skip(self), fields(scan_id = %ScanId::new()))]
    pub async fn run_once(&self) -> Result<ScanReport, DiscoveryError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("device scan already in flight, skipping");
            return Err(DiscoveryError::AlreadyRunning);
        };

        tracing::info!("device scan started");
        let descriptors = match tokio::time::timeout(self.scan_timeout, self.adapter.scan()).await
        {
            Ok(Ok(descriptors)) => descriptors,
            Ok(Err(err)) => {
                tracing::warn!(%err, "device scan failed, keeping existing devices");
                return Err(err.into());
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.scan_timeout.as_secs(),
                    "device scan timed out, keeping existing devices"
                );
                return Err(DiscoveryError::TimedOut(self.scan_timeout));
            }
        };

        let report = self.merge(descriptors);
        tracing::info!(
            discovered = report.discovered,
            inserted = report.inserted,
            updated = report.updated,
            reconnect_required = report.reconnect_required,
            dropped_incomplete = report.dropped_incomplete,
            stale = report.stale,
            "device list updated"
        );
        Ok(report)
    }

    fn merge(&self, descriptors: Vec<DeviceDescriptor>) -> ScanReport {
        let seen_at = now();
        let mut report = ScanReport::default();
        let mut records = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            match descriptor.into_record(seen_at) {
                Ok(record) => {
                    tracing::debug!(
                        name = %record.name,
                        address = %record.connection.address,
                        version = %record.connection.protocol_version,
                        "device found"
                    );
                    records.push(record);
                }
                Err(err) => {
                    tracing::warn!(
                        name = %err.name,
                        missing = %err.missing,
                        "dropping incomplete device"
                    );
                    report.dropped_incomplete += 1;
                }
            }
        }

        let seen: HashSet<String> = records.iter().map(|r| r.key()).collect();
        report.discovered = records.len();

        for outcome in self.registry.upsert_all(records) {
            match outcome {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::Updated { connection_kept } => {
                    report.updated += 1;
                    if !connection_kept {
                        report.reconnect_required += 1;
                    }
                }
            }
        }
        report.stale = self.registry.count_absent_from(&seen);
        report
    }

    /// Scan every `interval` until `shutdown` is cancelled.
    ///
    /// The first scan happens one full interval after the call. Ticks that
    /// fire while a scan is still running are dropped: the next scan starts
    /// one full interval after the previous one finished. A scan interrupted
    /// by shutdown is abandoned before its merge. A zero interval, or one too
    /// large to schedule, disables periodic discovery.
    pub async fn run_periodic(&self, interval: Duration, shutdown: CancellationToken) {
        let start = (!interval.is_zero())
            .then(|| tokio::time::Instant::now().checked_add(interval))
            .flatten();
        let Some(start) = start else {
            tracing::warn!(?interval, "invalid discovery interval, periodic discovery disabled");
            return;
        };
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tracing::debug!("running periodic device discovery");
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("shutdown during device scan, discarding its results");
                    break;
                }
                // Failures are logged inside `run_once`; the next tick retries.
                _ = self.run_once() => {}
            }
            ticker.reset();
        }

        tracing::info!("periodic device discovery stopped");
    }
}

impl<P: ProtocolAdapter + 'static> DiscoveryService<P> {
    /// Spawn [`run_periodic`](Self::run_periodic) on its own task.
    ///
    /// Cancel `shutdown` and await the handle to stop it cleanly.
    pub fn spawn_periodic(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_periodic(interval, shutdown).await })
    }
}
