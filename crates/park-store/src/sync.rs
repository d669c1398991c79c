use tracing::{debug, info, warn};

use crate::OccupancyStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Persisted value already matched; nothing written.
    Unchanged,
    /// Value written. `previous` is what the store held before (None = unknown).
    Written { previous: Option<bool> },
    /// Read or write failed. Left for the next frame to retry.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSync {
    pub zone: String,
    pub occupied: bool,
    /// Value the store held before this frame; None when missing or unreadable.
    pub persisted: Option<bool>,
    pub outcome: SyncOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub zones: Vec<ZoneSync>,
}

impl SyncReport {
    pub fn writes(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Written { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| *o == SyncOutcome::Unchanged)
    }

    pub fn unresolved(&self) -> usize {
        self.count(|o| *o == SyncOutcome::Unresolved)
    }

    pub fn get(&self, zone: &str) -> Option<&ZoneSync> {
        self.zones.iter().find(|z| z.zone == zone)
    }

    fn count(&self, f: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.zones.iter().filter(|z| f(&z.outcome)).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreHealth {
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub total_writes: u64,
}

/// Read-before-write reconciliation of per-frame decisions against the store.
///
/// Holds no zone state between calls; only failure counters for logging.
#[derive(Debug, Default)]
pub struct Synchronizer {
    health: StoreHealth,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self) -> &StoreHealth {
        &self.health
    }

    /// Zones are handled independently; a failure on one never stops the rest.
    pub fn reconcile<S, I, N>(&mut self, store: &mut S, decisions: I) -> SyncReport
    where
        S: OccupancyStore + ?Sized,
        I: IntoIterator<Item = (N, bool)>,
        N: AsRef<str>,
    {
        let mut report = SyncReport::default();
        for (name, occupied) in decisions {
            let zone = name.as_ref();
            let (persisted, outcome) = self.reconcile_zone(store, zone, occupied);
            report.zones.push(ZoneSync { zone: zone.to_string(), occupied, persisted, outcome });
        }
        report
    }

    fn reconcile_zone<S>(&mut self, store: &mut S, zone: &str, occupied: bool) -> (Option<bool>, SyncOutcome)
    where
        S: OccupancyStore + ?Sized,
    {
        let previous = match store.read(zone) {
            Ok(v) => v,
            Err(e) => {
                self.on_failure();
                warn!("sync: read {} failed (failures: {}): {:#}", zone, self.health.consecutive_failures, e);
                return (None, SyncOutcome::Unresolved);
            }
        };

        if previous == Some(occupied) {
            self.on_success();
            return (previous, SyncOutcome::Unchanged);
        }

        let outcome = match store.merge_write(zone, occupied) {
            Ok(()) => {
                self.on_success();
                self.health.total_writes += 1;
                match previous {
                    Some(p) => info!("sync: {} {} -> {}", zone, state_str(p), state_str(occupied)),
                    None => debug!("sync: {} initialised {}", zone, state_str(occupied)),
                }
                SyncOutcome::Written { previous }
            }
            Err(e) => {
                self.on_failure();
                warn!("sync: write {} failed (failures: {}): {:#}", zone, self.health.consecutive_failures, e);
                SyncOutcome::Unresolved
            }
        };
        (previous, outcome)
    }

    fn on_success(&mut self) {
        if self.health.consecutive_failures > 0 {
            info!("sync: store reachable again after {} failures", self.health.consecutive_failures);
            self.health.consecutive_failures = 0;
        }
    }

    fn on_failure(&mut self) {
        self.health.consecutive_failures += 1;
        self.health.total_failures += 1;
    }
}

fn state_str(occupied: bool) -> &'static str {
    if occupied { "occupied" } else { "vacant" }
}
