//! Telemetry fixtures.
//!
//! Builders for driver snapshots and two-tick fields so detector tests can
//! describe a scenario in a line or two.

use caution_telemetry::{DriverField, DriverId, DriverSnapshot, SessionFlags, TrackLocation};
use std::time::Duration;

/// A competitor on track at `lap_distance` with no completed laps.
pub fn car(id: i32, lap_distance: f64) -> DriverSnapshot {
    DriverSnapshot::new(DriverId(id)).with_lap_distance(lap_distance)
}

/// A competitor at `lap_distance` having completed `laps`.
pub fn car_on_lap(id: i32, laps: i32, lap_distance: f64) -> DriverSnapshot {
    car(id, lap_distance).with_laps_completed(laps)
}

/// A competitor reported off the racing surface.
pub fn off_track(id: i32, lap_distance: f64) -> DriverSnapshot {
    car(id, lap_distance).with_track_location(TrackLocation::OffTrack)
}

/// A competitor on pit road at `lap_distance`.
pub fn on_pit_road(id: i32, lap_distance: f64) -> DriverSnapshot {
    car(id, lap_distance).with_on_pit_road(true)
}

/// A competitor carrying `flags`.
pub fn flagged(id: i32, flags: SessionFlags) -> DriverSnapshot {
    car(id, 0.5).with_session_flags(flags)
}

/// The pace car.
pub fn pace_car(id: i32, lap_distance: f64) -> DriverSnapshot {
    car(id, lap_distance).with_pace_car(true)
}

/// A field with previous and current ticks at `session_secs`.
pub fn field_at(
    session_secs: f64,
    previous: Vec<DriverSnapshot>,
    current: Vec<DriverSnapshot>,
) -> DriverField {
    DriverField::from_ticks(previous, current, Duration::from_secs_f64(session_secs))
}

/// A field with only a current tick.
pub fn single_tick(session_secs: f64, current: Vec<DriverSnapshot>) -> DriverField {
    field_at(session_secs, Vec::new(), current)
}

/// `count` competitors spread evenly around the lap, all moving forward by
/// `step` between ticks.
pub fn moving_field(session_secs: f64, count: i32, step: f64) -> DriverField {
    let spacing = 1.0 / f64::from(count.max(1));
    let previous: Vec<_> = (0..count)
        .map(|i| car(i, f64::from(i) * spacing))
        .collect();
    let current = previous
        .iter()
        .map(|d| {
            let next = d.lap_distance + step;
            car_on_lap(d.driver_id.0, next.floor() as i32, next.rem_euclid(1.0))
        })
        .collect();
    field_at(session_secs, previous, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_field_advances_every_car() {
        let field = moving_field(10.0, 4, 0.01);
        assert_eq!(field.len(), 4);
        for (current, previous) in field.paired() {
            assert!(current.race_position() > previous.race_position());
        }
    }

    #[test]
    fn moving_field_wraps_the_lap() {
        let field = moving_field(10.0, 2, 0.6);
        let last = field.current().iter().find(|d| d.driver_id == DriverId(1));
        assert!(last.is_some_and(|d| d.laps_completed == 1));
    }
}
