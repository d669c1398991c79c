pub mod doctor;
pub mod geom;
pub mod occupancy;
pub mod palette;
pub mod trails;
pub mod zones;

pub use occupancy::{Aggregator, ZoneOccupancy, DEFAULT_OCCUPIED_THRESHOLD};
pub use trails::{TrailManager, DEFAULT_TRAIL_LEN};
pub use zones::{Zone, ZoneError, ZoneSet};
