use std::collections::{HashMap, HashSet, VecDeque};

use park_proto::Point;

pub const DEFAULT_TRAIL_LEN: usize = 64;

/// Bounded recent-position history per track id, most recent first.
///
/// Entries only go away through [`TrailManager::update`]: an id missing from a
/// frame loses its whole trail at once, and a later reappearance of the same
/// number starts a fresh one.
#[derive(Debug, Clone)]
pub struct TrailManager {
    capacity: usize,
    trails: HashMap<u64, VecDeque<Point>>,
}

impl Default for TrailManager {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_LEN)
    }
}

impl TrailManager {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), trails: HashMap::new() }
    }

    /// Drops every trail whose id is not in `current`. Returns how many were evicted.
    /// Must run before the frame's centers are recorded.
    pub fn update(&mut self, current: &HashSet<u64>) -> usize {
        let before = self.trails.len();
        self.trails.retain(|id, _| current.contains(id));
        before - self.trails.len()
    }

    pub fn record(&mut self, id: u64, center: Point) {
        let cap = self.capacity;
        let trail = self.trails.entry(id).or_insert_with(|| VecDeque::with_capacity(cap));
        trail.push_front(center);
        trail.truncate(cap);
    }

    /// Unknown ids yield an empty trail; a render request can race an eviction.
    pub fn trail_of(&self, id: u64) -> Vec<Point> {
        self.trails.get(&id).map(|t| t.iter().copied().collect()).unwrap_or_default()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.trails.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    pub fn clear(&mut self) {
        self.trails.clear();
    }
}
