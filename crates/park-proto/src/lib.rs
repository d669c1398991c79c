pub mod frame;
pub mod overlay;

pub use frame::{BBox, FrameDetections, Point, TrackedDetection};
pub use overlay::{OverlayFrame, Rgb, TrackOverlay, ZoneOverlay};
