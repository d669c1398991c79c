use std::collections::HashSet;

use park_proto::{BBox, FrameDetections, OverlayFrame, TrackOverlay, TrackedDetection, ZoneOverlay};
use park_store::{OccupancyStore, SyncReport, Synchronizer};
use park_vision::palette::{label_for, zone_color, ClassPalette};
use park_vision::{Aggregator, TrailManager, ZoneOccupancy, ZoneSet};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub threshold: f64,
    pub trail_len: usize,
    pub class_names: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: park_vision::DEFAULT_OCCUPIED_THRESHOLD,
            trail_len: park_vision::DEFAULT_TRAIL_LEN,
            class_names: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameResult {
    pub occupancy: Vec<ZoneOccupancy>,
    pub sync: SyncReport,
    pub overlay: OverlayFrame,
    pub dropped: usize,
}

/// Per-run state: trails, zones and the store reconciler. Built at pipeline start,
/// dropped at stop; frames must be fed strictly in arrival order.
pub struct Pipeline {
    zones: ZoneSet,
    trails: TrailManager,
    aggregator: Aggregator,
    sync: Synchronizer,
    palette: ClassPalette,
    class_names: Vec<String>,
    frames: u64,
}

impl Pipeline {
    pub fn new(zones: ZoneSet, cfg: PipelineConfig) -> Self {
        Self {
            zones,
            trails: TrailManager::new(cfg.trail_len),
            aggregator: Aggregator::new(cfg.threshold),
            sync: Synchronizer::new(),
            palette: ClassPalette::default(),
            class_names: cfg.class_names,
            frames: 0,
        }
    }

    pub fn trails(&self) -> &TrailManager {
        &self.trails
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forget all trails, as on a pipeline restart.
    pub fn reset(&mut self) {
        self.trails.clear();
        self.frames = 0;
    }

    pub fn process<S>(&mut self, frame: &FrameDetections, store: &mut S) -> FrameResult
    where
        S: OccupancyStore + ?Sized,
    {
        self.frames += 1;

        // Whole-pixel corners, as the tracker's integer boxes are drawn and measured.
        let dets: Vec<TrackedDetection> = frame
            .detections
            .iter()
            .filter(|d| {
                let ok = d.bbox.is_valid();
                if !ok {
                    debug!("pipeline: frame {} dropping track {} bbox {:?}", frame.frame, d.track_id, d.bbox);
                }
                ok
            })
            .map(|d| TrackedDetection { bbox: d.bbox.truncated(), ..d.clone() })
            .collect();
        let dropped = frame.detections.len() - dets.len();

        let ids: HashSet<u64> = dets.iter().map(|d| d.track_id).collect();
        let evicted = self.trails.update(&ids);
        for d in &dets {
            self.trails.record(d.track_id, d.bbox.center());
        }

        let boxes: Vec<BBox> = dets.iter().map(|d| d.bbox).collect();
        let occupancy = self.aggregator.aggregate(&boxes, &self.zones);
        let sync = self.sync.reconcile(store, occupancy.iter().map(|z| (z.name.as_str(), z.occupied)));

        let zones = self
            .zones
            .iter()
            .zip(&occupancy)
            .zip(&sync.zones)
            .map(|((z, o), s)| ZoneOverlay {
                name: z.name.clone(),
                rect: z.rect,
                occupied: o.occupied,
                fraction: o.fraction,
                persisted: s.persisted,
                color: zone_color(s.persisted.unwrap_or(false)),
            })
            .collect();
        let tracks = dets
            .iter()
            .map(|d| TrackOverlay {
                track_id: d.track_id,
                class_id: d.class_id,
                bbox: d.bbox,
                label: label_for(d.track_id, d.class_id, &self.class_names),
                color: self.palette.color_for(d.class_id),
                trail: self.trails.trail_of(d.track_id),
            })
            .collect();
        let overlay = OverlayFrame {
            frame: frame.frame,
            ts_unix_ms: (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
            zones,
            tracks,
        };

        debug!(
            "pipeline: frame {} dets={} dropped={} evicted={} writes={} unresolved={}",
            frame.frame, dets.len(), dropped, evicted, sync.writes(), sync.unresolved()
        );
        FrameResult { occupancy, sync, overlay, dropped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_store::{MemoryStore, SyncOutcome};
    use park_vision::Zone;

    fn lot_a() -> Pipeline {
        let zones = ZoneSet::new(vec![Zone::new("A", 0.0, 0.0, 100.0, 100.0)]).unwrap();
        Pipeline::new(
            zones,
            PipelineConfig { class_names: vec!["person".into(), "bicycle".into(), "car".into()], ..Default::default() },
        )
    }

    fn det(id: u64, b: [f32; 4]) -> TrackedDetection {
        TrackedDetection { bbox: BBox::from(b), track_id: id, class_id: 2 }
    }

    fn frame(n: u64, detections: Vec<TrackedDetection>) -> FrameDetections {
        FrameDetections { frame: n, detections }
    }

    #[test]
    fn empty_first_frame_marks_zone_vacant() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        let r = p.process(&frame(1, vec![]), &mut store);
        assert_eq!(r.occupancy[0].fraction, 0.0);
        assert!(!r.occupancy[0].occupied);
        assert_eq!(store.get("A"), Some(false));
    }

    #[test]
    fn occupied_lot_is_persisted_once() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        let f = frame(1, vec![det(1, [0.0, 0.0, 60.0, 100.0])]);

        let r1 = p.process(&f, &mut store);
        assert!(r1.occupancy[0].occupied);
        assert_eq!(r1.sync.writes(), 1);

        let r2 = p.process(&f, &mut store);
        assert_eq!(r2.sync.writes(), 0);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get("A"), Some(true));
    }

    #[test]
    fn already_persisted_state_needs_no_write() {
        let mut p = lot_a();
        let mut store = MemoryStore::new().with_state("A", true);
        let r = p.process(&frame(1, vec![det(1, [0.0, 0.0, 60.0, 100.0])]), &mut store);
        assert_eq!(r.sync.get("A").unwrap().outcome, SyncOutcome::Unchanged);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn malformed_detections_are_dropped_not_fatal() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        let f = frame(
            1,
            vec![
                det(1, [60.0, 0.0, 0.0, 100.0]),
                det(2, [0.0, f32::NAN, 60.0, 100.0]),
                det(3, [0.0, 0.0, 30.0, 100.0]),
            ],
        );
        let r = p.process(&f, &mut store);
        assert_eq!(r.dropped, 2);
        assert_eq!(r.occupancy[0].coverage, 3000.0);
        assert!(!p.trails().contains(1));
        assert!(p.trails().contains(3));
    }

    #[test]
    fn trails_follow_frames_and_evict_lost_tracks() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();

        p.process(&frame(1, vec![det(1, [0.0, 0.0, 10.0, 10.0]), det(2, [50.0, 50.0, 60.0, 60.0])]), &mut store);
        let r = p.process(&frame(2, vec![det(1, [10.0, 0.0, 20.0, 10.0])]), &mut store);

        assert_eq!(p.trails().trail_of(1).len(), 2);
        assert_eq!(p.trails().trail_of(1)[0], park_proto::Point { x: 15, y: 5 });
        assert!(p.trails().trail_of(2).is_empty());

        let t = &r.overlay.tracks[0];
        assert_eq!(t.label, "1:car");
        assert_eq!(t.trail.len(), 2);

        // id 2 comes back: fresh trail
        p.process(&frame(3, vec![det(2, [50.0, 50.0, 60.0, 60.0])]), &mut store);
        assert_eq!(p.trails().trail_of(2).len(), 1);
        assert!(p.trails().trail_of(1).is_empty());
    }

    #[test]
    fn store_outage_is_retried_next_frame() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        store.fail_writes_for("A");
        let f = frame(1, vec![det(1, [0.0, 0.0, 60.0, 100.0])]);

        let r = p.process(&f, &mut store);
        assert_eq!(r.sync.unresolved(), 1);
        // decision is still reported, colour stays on the unknown stored state
        assert!(r.overlay.zones[0].occupied);
        assert_eq!(r.overlay.zones[0].persisted, None);
        assert_eq!(r.overlay.zones[0].color, park_vision::palette::ZONE_VACANT);

        store.clear_failures();
        let r = p.process(&f, &mut store);
        assert_eq!(r.sync.writes(), 1);
        assert_eq!(store.get("A"), Some(true));
    }

    #[test]
    fn zone_colour_follows_stored_state_until_next_frame() {
        use park_vision::palette::{ZONE_OCCUPIED, ZONE_VACANT};

        let mut p = lot_a();
        let mut store = MemoryStore::new().with_state("A", false);
        let parked = frame(1, vec![det(1, [0.0, 0.0, 60.0, 100.0])]);

        // change frame: decided occupied, drawn with the vacant state it read
        let r = p.process(&parked, &mut store);
        let z = &r.overlay.zones[0];
        assert!(z.occupied);
        assert_eq!(z.persisted, Some(false));
        assert_eq!(z.color, ZONE_VACANT);

        let r = p.process(&parked, &mut store);
        let z = &r.overlay.zones[0];
        assert_eq!(z.persisted, Some(true));
        assert_eq!(z.color, ZONE_OCCUPIED);
    }

    #[test]
    fn missing_stored_state_draws_vacant() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        let r = p.process(&frame(1, vec![det(1, [0.0, 0.0, 100.0, 100.0])]), &mut store);
        assert_eq!(r.overlay.zones[0].persisted, None);
        assert_eq!(r.overlay.zones[0].color, park_vision::palette::ZONE_VACANT);
    }

    #[test]
    fn fractional_boxes_are_measured_in_whole_pixels() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        // raw width 49.6 px is under half the lot; whole pixels give exactly 50 px
        let r = p.process(&frame(1, vec![det(1, [0.9, 0.0, 50.5, 100.0])]), &mut store);
        assert_eq!(r.occupancy[0].coverage, 5000.0);
        assert!(r.occupancy[0].occupied);
        assert_eq!(r.overlay.tracks[0].bbox, BBox::new(0.0, 0.0, 50.0, 100.0));

        // 49.99 px becomes 49 px
        let r = p.process(&frame(2, vec![det(1, [0.0, 0.0, 49.99, 100.0])]), &mut store);
        assert_eq!(r.occupancy[0].coverage, 4900.0);
        assert!(!r.occupancy[0].occupied);
        assert_eq!(p.trails().trail_of(1)[0], park_proto::Point { x: 24, y: 50 });
    }

    #[test]
    fn repeated_track_id_counts_twice() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        let r = p.process(
            &frame(1, vec![det(4, [0.0, 0.0, 30.0, 100.0]), det(4, [70.0, 0.0, 100.0, 100.0])]),
            &mut store,
        );
        assert_eq!(r.occupancy[0].coverage, 6000.0);
        assert!(r.occupancy[0].occupied);
        assert_eq!(
            p.trails().trail_of(4),
            vec![park_proto::Point { x: 85, y: 50 }, park_proto::Point { x: 15, y: 50 }]
        );
    }

    #[test]
    fn reset_clears_trails() {
        let mut p = lot_a();
        let mut store = MemoryStore::new();
        p.process(&frame(1, vec![det(1, [0.0, 0.0, 10.0, 10.0])]), &mut store);
        p.reset();
        assert!(p.trails().is_empty());
        assert_eq!(p.frames(), 0);
    }
}
