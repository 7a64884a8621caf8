//! Pit-entry anomaly detection.
//!
//! A car that tows back to the pits appears on pit road without having
//! driven the pit lane entry. The detector learns where cars normally join
//! pit road and flags entries that jump there from far away.

use crate::{DetectionResult, Detector, IncidentType};
use caution_telemetry::{DriverField, DriverId, DriverSnapshot};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Largest forward lap-distance jump that still counts as driving onto pit road.
pub const DEFAULT_MAX_PIT_ENTRY_DELTA: f64 = 0.05;

/// Observations required before an entry can be flagged as a tow.
pub const DEFAULT_MIN_OBSERVATIONS: usize = 3;

/// Estimate of where cars enter pit road, for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitEntryStatistics {
    /// Median observed pit-entry lap distance.
    pub estimated_location: Option<f64>,
    /// Sample standard deviation of the observations (0.0 with a single one).
    pub confidence_interval: Option<f64>,
    /// Number of recorded observations.
    pub observation_count: usize,
}

impl fmt::Display for PitEntryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.estimated_location, self.confidence_interval) {
            (Some(location), Some(spread)) => write!(
                f,
                "location={location:.3}, CI=±{spread:.3}, n={}",
                self.observation_count
            ),
            _ => write!(f, "no data"),
        }
    }
}

/// Running model of observed pit-entry locations.
#[derive(Debug, Clone, Default)]
pub struct PitEntryModel {
    observations: Vec<f64>,
    statistics: PitEntryStatistics,
}

impl PitEntryModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pit-entry lap distance and refresh the statistics.
    pub fn record(&mut self, lap_distance: f64) {
        let at = self.observations.partition_point(|o| *o <= lap_distance);
        self.observations.insert(at, lap_distance);
        self.statistics = self.compute();
        tracing::debug!(statistics = %self.statistics, "Updated pit entry statistics");
    }

    /// Observations in ascending order.
    pub fn observations(&self) -> &[f64] {
        &self.observations
    }

    /// Number of recorded observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Current statistics.
    pub fn statistics(&self) -> PitEntryStatistics {
        self.statistics
    }

    fn compute(&self) -> PitEntryStatistics {
        let n = self.observations.len();
        let Some(median) = median(&self.observations) else {
            return PitEntryStatistics::default();
        };
        let spread = if n >= 2 {
            sample_std_dev(&self.observations)
        } else {
            0.0
        };
        PitEntryStatistics {
            estimated_location: Some(median),
            confidence_interval: Some(spread),
            observation_count: n,
        }
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 1 {
        sorted.get(mid).copied()
    } else {
        let lo = sorted.get(mid.checked_sub(1)?)?;
        let hi = sorted.get(mid)?;
        Some((lo + hi) / 2.0)
    }
}

fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (n - 1.0)).sqrt()
}

/// Forward distance from `from` to `to` around the lap, in `[0.0, 1.0)`.
pub fn forward_lap_delta(from: f64, to: f64) -> f64 {
    let delta = to - from;
    if delta < 0.0 { delta + 1.0 } else { delta }
}

#[derive(Debug, Clone, Copy)]
struct PitRoadState {
    on_pit_road: bool,
    lap_distance: f64,
}

/// Flags cars that appear on pit road far from the learned pit entry.
#[derive(Debug, Clone)]
pub struct TowingDetector {
    max_pit_entry_delta: f64,
    min_observations: usize,
    previous: HashMap<DriverId, PitRoadState>,
    model: PitEntryModel,
}

impl Default for TowingDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIT_ENTRY_DELTA, DEFAULT_MIN_OBSERVATIONS)
    }
}

impl TowingDetector {
    /// Create a detector with the given delta and confidence requirements.
    pub fn new(max_pit_entry_delta: f64, min_observations: usize) -> Self {
        tracing::info!(max_pit_entry_delta, min_observations, "Towing detector initialized");
        Self {
            max_pit_entry_delta,
            min_observations,
            previous: HashMap::new(),
            model: PitEntryModel::new(),
        }
    }

    /// Current pit-entry estimate.
    pub fn statistics(&self) -> PitEntryStatistics {
        self.model.statistics()
    }

    /// The learned pit-entry model.
    pub fn model(&self) -> &PitEntryModel {
        &self.model
    }

    /// True when `lap_distance` lies within the max delta of the estimated
    /// pit entry, measured both ways around the lap.
    ///
    /// Without an estimate every location is accepted.
    pub fn is_near_pit_entry(&self, lap_distance: f64) -> bool {
        let Some(estimate) = self.model.statistics().estimated_location else {
            return true;
        };
        let ahead = forward_lap_delta(estimate, lap_distance);
        let behind = forward_lap_delta(lap_distance, estimate);
        ahead.min(behind) <= self.max_pit_entry_delta
    }

    fn on_pit_road_entry(&mut self, driver: &DriverSnapshot, prev_lap_distance: f64) -> bool {
        let current = driver.lap_distance;
        let delta = forward_lap_delta(prev_lap_distance, current);
        let car = driver.driver_id;

        if delta <= self.max_pit_entry_delta {
            self.model.record(current);
            tracing::info!(driver = %car, at = current, delta, "Normal pit entry");
            return false;
        }

        if self.model.len() < self.min_observations {
            tracing::debug!(
                driver = %car,
                at = current,
                delta,
                "Large pit entry delta but too few observations to confirm a tow"
            );
            return false;
        }

        if self.is_near_pit_entry(current) {
            self.model.record(current);
            tracing::info!(driver = %car, at = current, delta, "Slow pit entry");
            return false;
        }

        tracing::warn!(
            driver = %car,
            at = current,
            delta,
            expected = ?self.model.statistics().estimated_location,
            "Car likely towed to pit road"
        );
        true
    }
}

impl Detector for TowingDetector {
    fn detect(&mut self, field: &DriverField) -> DetectionResult {
        let mut towed = Vec::new();

        for driver in field.current().iter().filter(|d| d.is_competitor()) {
            let previous = self.previous.insert(
                driver.driver_id,
                PitRoadState {
                    on_pit_road: driver.on_pit_road,
                    lap_distance: driver.lap_distance,
                },
            );

            if let Some(prev) = previous
                && !prev.on_pit_road
                && driver.on_pit_road
                && self.on_pit_road_entry(driver, prev.lap_distance)
            {
                towed.push(*driver);
            }
        }

        if !towed.is_empty() {
            tracing::info!(count = towed.len(), "Drivers likely towed");
        }

        DetectionResult::drivers(IncidentType::Towing, towed)
    }

    fn pit_entry_statistics(&self) -> Option<PitEntryStatistics> {
        Some(self.statistics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::time::Duration;

    fn car(id: i32, lap_distance: f64, on_pit_road: bool) -> DriverSnapshot {
        DriverSnapshot::new(DriverId(id))
            .with_lap_distance(lap_distance)
            .with_on_pit_road(on_pit_road)
            .with_laps_completed(2)
    }

    /// Feed two ticks for a single car and return whether it was flagged.
    fn enter(detector: &mut TowingDetector, id: i32, from: f64, to: f64) -> bool {
        let mut field = DriverField::new();
        field.update(vec![car(id, from, false)], Duration::from_secs(1));
        detector.detect(&field);
        field.update(vec![car(id, to, true)], Duration::from_secs(2));
        detector
            .detect(&field)
            .offending_drivers()
            .is_some_and(|d| !d.is_empty())
    }

    #[test]
    fn forward_delta_wraps_across_the_line() {
        assert_relative_eq!(forward_lap_delta(0.2, 0.25), 0.05, epsilon = 1e-12);
        assert_relative_eq!(forward_lap_delta(0.98, 0.01), 0.03, epsilon = 1e-12);
        assert_relative_eq!(forward_lap_delta(0.5, 0.5), 0.0);
    }

    #[test]
    fn median_and_spread() {
        let mut model = PitEntryModel::new();
        assert_eq!(model.statistics(), PitEntryStatistics::default());

        model.record(0.92);
        let s = model.statistics();
        assert_eq!(s.observation_count, 1);
        assert_eq!(s.confidence_interval, Some(0.0));

        model.record(0.90);
        model.record(0.94);
        model.record(0.96);
        let s = model.statistics();
        assert_eq!(model.observations(), &[0.90, 0.92, 0.94, 0.96]);
        assert_relative_eq!(s.estimated_location.unwrap_or_default(), 0.93, epsilon = 1e-12);
        // sample std dev of {0.90, 0.92, 0.94, 0.96}
        let expected = (0.002f64 / 3.0).sqrt();
        assert_relative_eq!(s.confidence_interval.unwrap_or_default(), expected, epsilon = 1e-12);
    }

    #[test]
    fn normal_entries_are_recorded_not_flagged() {
        let mut detector = TowingDetector::default();
        assert!(!enter(&mut detector, 1, 0.88, 0.90));
        assert!(!enter(&mut detector, 2, 0.89, 0.91));
        assert_eq!(detector.statistics().observation_count, 2);
    }

    #[test]
    fn large_delta_without_confidence_is_ignored() {
        let mut detector = TowingDetector::default();
        assert!(!enter(&mut detector, 1, 0.88, 0.90));
        assert!(!enter(&mut detector, 2, 0.30, 0.90));
        assert_eq!(detector.statistics().observation_count, 1);
    }

    #[test]
    fn tow_far_from_pit_entry_is_flagged() {
        let mut detector = TowingDetector::default();
        for (id, at) in [(1, 0.90), (2, 0.91), (3, 0.92)] {
            assert!(!enter(&mut detector, id, at - 0.01, at));
        }
        assert!(enter(&mut detector, 4, 0.30, 0.50));
        assert_eq!(detector.statistics().observation_count, 3);
    }

    #[test]
    fn slow_approach_near_pit_entry_is_recorded() {
        let mut detector = TowingDetector::default();
        for (id, at) in [(1, 0.90), (2, 0.91), (3, 0.92)] {
            assert!(!enter(&mut detector, id, at - 0.01, at));
        }
        assert!(!enter(&mut detector, 4, 0.60, 0.93));
        assert_eq!(detector.statistics().observation_count, 4);
    }

    #[test]
    fn near_check_wraps_around_start_finish() {
        let mut detector = TowingDetector::default();
        for (id, at) in [(1, 0.99), (2, 0.99), (3, 0.98)] {
            assert!(!enter(&mut detector, id, at - 0.01, at));
        }
        assert!(detector.is_near_pit_entry(0.01));
        assert!(!detector.is_near_pit_entry(0.10));
    }

    #[test]
    fn pace_car_and_inactive_cars_are_skipped() {
        let mut detector = TowingDetector::default();
        for (id, at) in [(1, 0.90), (2, 0.91), (3, 0.92)] {
            enter(&mut detector, id, at - 0.01, at);
        }
        let mut field = DriverField::new();
        field.update(
            vec![
                car(10, 0.3, false).with_pace_car(true),
                car(11, 0.3, false).with_laps_completed(-1),
            ],
            Duration::from_secs(1),
        );
        detector.detect(&field);
        field.update(
            vec![
                car(10, 0.5, true).with_pace_car(true),
                car(11, 0.5, true).with_laps_completed(-1),
            ],
            Duration::from_secs(2),
        );
        let result = detector.detect(&field);
        assert_eq!(result.offending_drivers().map(<[_]>::len), Some(0));
    }

    #[test]
    fn statistics_display() {
        let mut model = PitEntryModel::new();
        assert_eq!(model.statistics().to_string(), "no data");
        model.record(0.5);
        assert_eq!(model.statistics().to_string(), "location=0.500, CI=±0.000, n=1");
    }
}
