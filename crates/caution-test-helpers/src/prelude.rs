//! Convenience re-exports for common test utilities.

pub use crate::fixtures::{
    car, car_on_lap, field_at, flagged, moving_field, off_track, on_pit_road, pace_car,
    single_tick,
};
pub use crate::must::{must, must_some, must_with};
pub use crate::{assert_drivers, assert_in_range};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
