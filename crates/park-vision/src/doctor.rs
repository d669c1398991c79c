use anyhow::Result;
use tracing::warn;

use crate::geom::iou;
use crate::zones::ZoneSet;

/// Sanity checks on zone definitions beyond what [`ZoneSet::new`] enforces.
/// Overlapping zones are allowed but almost always a typo in the lot file.
pub fn check_zones(zones: &ZoneSet, frame_w: Option<u32>, frame_h: Option<u32>) -> Result<usize> {
    anyhow::ensure!(!zones.is_empty(), "no zones defined");
    let all: Vec<_> = zones.iter().collect();
    let mut overlapping = 0;
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            let v = iou(&a.rect, &b.rect);
            if v > 0.0 {
                overlapping += 1;
                warn!("doctor: zones {} and {} overlap (iou={:.3})", a.name, b.name, v);
            }
        }
    }

    if let (Some(w), Some(h)) = (frame_w, frame_h) {
        for z in zones {
            anyhow::ensure!(
                z.rect.x1 >= 0.0 && z.rect.y1 >= 0.0 && z.rect.x2 <= w as f32 && z.rect.y2 <= h as f32,
                "zone {} lies outside the {}x{} frame",
                z.name, w, h
            );
        }
    }
    Ok(overlapping)
}
