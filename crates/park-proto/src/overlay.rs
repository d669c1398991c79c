use serde::{Deserialize, Serialize};

use crate::frame::{BBox, Point};

/// Colour triple in the renderer's channel order (BGR for OpenCV-style sinks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneOverlay {
    pub name: String,
    pub rect: BBox,
    /// This frame's decision.
    pub occupied: bool,
    pub fraction: f64,
    /// State the store held when the frame was reconciled; None if missing or unreadable.
    pub persisted: Option<bool>,
    /// Drawn from `persisted`, unknown shows as vacant.
    pub color: Rgb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackOverlay {
    pub track_id: u64,
    pub class_id: i32,
    pub bbox: BBox,
    pub label: String,
    pub color: Rgb,
    // most recent first
    pub trail: Vec<Point>,
}

/// Everything an external renderer needs to draw one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayFrame {
    pub frame: u64,
    pub ts_unix_ms: i64,
    pub zones: Vec<ZoneOverlay>,
    pub tracks: Vec<TrackOverlay>,
}
