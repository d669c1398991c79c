use serde::{Deserialize, Serialize};

/// Axis-aligned box in image pixel coordinates, corner form.
/// On the wire it is a plain `[x1, y1, x2, y2]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Area as f64; pixel products overflow f32's exact integer range on large frames.
    pub fn area(&self) -> f64 {
        (self.x2 as f64 - self.x1 as f64) * (self.y2 as f64 - self.y1 as f64)
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Finite and not inverted.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Corners truncated toward zero, the whole-pixel box trackers hand over.
    pub fn truncated(&self) -> Self {
        Self::new(self.x1.trunc(), self.y1.trunc(), self.x2.trunc(), self.y2.trunc())
    }

    /// Midpoint truncated to whole pixels (trail points are pixel positions).
    pub fn center(&self) -> Point {
        Point {
            x: ((self.x1 + self.x2) / 2.0) as i32,
            y: ((self.y1 + self.y2) / 2.0) as i32,
        }
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl From<[i32; 2]> for Point {
    fn from(v: [i32; 2]) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// One tracked object as emitted by the external tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDetection {
    pub bbox: BBox,
    pub track_id: u64,
    pub class_id: i32,
}

/// All tracker output for a single frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameDetections {
    #[serde(default)]
    pub frame: u64,
    #[serde(default)]
    pub detections: Vec<TrackedDetection>,
}
