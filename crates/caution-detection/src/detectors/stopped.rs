//! Cars that made no forward progress since the previous tick.

use crate::{DetectionResult, Detector, IncidentType};
use caution_telemetry::{DriverField, DriverSnapshot};

/// Compares `laps_completed + lap_distance` between consecutive ticks.
///
/// When (almost) the whole field appears stopped the result is discarded:
/// that pattern comes from a frozen telemetry feed, not a mass pile-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoppedDetector;

impl StoppedDetector {
    /// Create the detector.
    pub fn new() -> Self {
        Self
    }
}

impl Detector for StoppedDetector {
    fn detect(&mut self, field: &DriverField) -> DetectionResult {
        let mut stopped: Vec<DriverSnapshot> = field
            .paired()
            .filter(|(current, _)| !current.track_location.is_pit_or_absent())
            .filter(|(current, _)| current.lap_distance >= 0.0)
            .filter(|(current, previous)| current.race_position() <= previous.race_position())
            .map(|(current, _)| *current)
            .collect();

        let field_size = field.len();
        if !stopped.is_empty() && stopped.len() >= field_size.saturating_sub(1) {
            tracing::debug!(
                stopped = stopped.len(),
                field_size,
                "Whole field reported stopped, treating as telemetry lag"
            );
            stopped.clear();
        } else if !stopped.is_empty() {
            tracing::debug!(count = stopped.len(), "Cars stopped on track");
        }

        DetectionResult::drivers(IncidentType::Stopped, stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caution_telemetry::{DriverId, TrackLocation};
    use core::time::Duration;

    fn car(id: i32, laps: i32, lap_distance: f64) -> DriverSnapshot {
        DriverSnapshot::new(DriverId(id))
            .with_laps_completed(laps)
            .with_lap_distance(lap_distance)
    }

    fn stopped_ids(previous: Vec<DriverSnapshot>, current: Vec<DriverSnapshot>) -> Vec<i32> {
        let field = DriverField::from_ticks(previous, current, Duration::from_secs(1));
        StoppedDetector::new()
            .detect(&field)
            .offending_drivers()
            .map(|d| d.iter().map(|s| s.driver_id.0).collect())
            .unwrap_or_default()
    }

    #[test]
    fn flags_car_without_progress() {
        let previous = vec![car(0, 1, 0.5), car(1, 1, 0.3), car(2, 1, 0.7), car(3, 1, 0.1)];
        let current = vec![car(0, 1, 0.5), car(1, 1, 0.31), car(2, 1, 0.72), car(3, 1, 0.12)];
        assert_eq!(stopped_ids(previous, current), vec![0]);
    }

    #[test]
    fn crossing_the_line_counts_as_progress() {
        let previous = vec![car(0, 1, 0.99), car(1, 1, 0.3), car(2, 1, 0.5)];
        let current = vec![car(0, 2, 0.01), car(1, 1, 0.31), car(2, 1, 0.5)];
        assert_eq!(stopped_ids(previous, current), vec![2]);
    }

    #[test]
    fn skips_pit_cars_and_negative_distance() {
        let previous = vec![car(0, 1, 0.5), car(1, 1, 0.5), car(2, 1, 0.2), car(3, 1, 0.2)];
        let current = vec![
            car(0, 1, 0.5).with_track_location(TrackLocation::InPitStall),
            car(1, 1, -1.0),
            car(2, 1, 0.2),
            car(3, 1, 0.3),
        ];
        assert_eq!(stopped_ids(previous, current), vec![2]);
    }

    #[test]
    fn whole_field_minus_one_is_discarded() {
        let previous = vec![car(0, 1, 0.5), car(1, 1, 0.3), car(2, 1, 0.7)];
        let current = vec![car(0, 1, 0.5), car(1, 1, 0.3), car(2, 1, 0.71)];
        assert!(stopped_ids(previous, current).is_empty());
    }

    #[test]
    fn first_tick_has_nothing_to_compare() {
        assert!(stopped_ids(Vec::new(), vec![car(0, 1, 0.5), car(1, 1, 0.5)]).is_empty());
    }
}
