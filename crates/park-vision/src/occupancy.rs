use park_proto::BBox;

use crate::geom::intersection_area;
use crate::zones::ZoneSet;

pub const DEFAULT_OCCUPIED_THRESHOLD: f64 = 0.5;

/// One zone's result for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneOccupancy {
    pub name: String,
    /// Summed intersection area of all detections with the zone.
    pub coverage: f64,
    pub fraction: f64,
    pub occupied: bool,
}

/// Per-frame coverage aggregation. Stateless: every call sees one frame only.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    threshold: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self { threshold: DEFAULT_OCCUPIED_THRESHOLD }
    }
}

impl Aggregator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns one entry per zone, in zone definition order, even for an empty frame.
    ///
    /// Overlapping detections inside a zone are summed without deduplication, so
    /// `coverage` can exceed the zone area. Only the threshold comparison matters.
    pub fn aggregate(&self, boxes: &[BBox], zones: &ZoneSet) -> Vec<ZoneOccupancy> {
        let mut coverage = vec![0.0f64; zones.len()];
        for b in boxes {
            for (i, z) in zones.iter().enumerate() {
                coverage[i] += intersection_area(b, &z.rect);
            }
        }

        zones
            .iter()
            .zip(coverage)
            .map(|(z, coverage)| {
                let fraction = coverage / z.area();
                ZoneOccupancy {
                    name: z.name.clone(),
                    coverage,
                    fraction,
                    occupied: fraction >= self.threshold,
                }
            })
            .collect()
    }
}
