use anyhow::Result;
use std::collections::{HashMap, HashSet};

use crate::OccupancyStore;

/// In-process store. Used for dry runs and to observe store traffic in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    docs: HashMap<String, bool>,
    reads: usize,
    writes: usize,
    fail_reads: HashSet<String>,
    fail_writes: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, zone: &str, occupied: bool) -> Self {
        self.docs.insert(zone.to_string(), occupied);
        self
    }

    pub fn fail_reads_for(&mut self, zone: &str) {
        self.fail_reads.insert(zone.to_string());
    }

    pub fn fail_writes_for(&mut self, zone: &str) {
        self.fail_writes.insert(zone.to_string());
    }

    pub fn clear_failures(&mut self) {
        self.fail_reads.clear();
        self.fail_writes.clear();
    }

    pub fn get(&self, zone: &str) -> Option<bool> {
        self.docs.get(zone).copied()
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl OccupancyStore for MemoryStore {
    fn read(&mut self, zone: &str) -> Result<Option<bool>> {
        self.reads += 1;
        anyhow::ensure!(!self.fail_reads.contains(zone), "read {} unavailable", zone);
        Ok(self.docs.get(zone).copied())
    }

    fn merge_write(&mut self, zone: &str, occupied: bool) -> Result<()> {
        anyhow::ensure!(!self.fail_writes.contains(zone), "write {} unavailable", zone);
        self.writes += 1;
        self.docs.insert(zone.to_string(), occupied);
        Ok(())
    }
}
