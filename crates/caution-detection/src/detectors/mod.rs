//! Detector variants.

mod driver_flags;
mod off_track;
mod random;
mod stopped;
mod towing;

pub use driver_flags::DriverFlagsDetector;
pub use off_track::OffTrackDetector;
pub use random::{RandomDetector, per_tick_probability};
pub use stopped::StoppedDetector;
pub use towing::{
    DEFAULT_MAX_PIT_ENTRY_DELTA, DEFAULT_MIN_OBSERVATIONS, PitEntryModel, PitEntryStatistics,
    TowingDetector, forward_lap_delta,
};
