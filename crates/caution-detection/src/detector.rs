//! The detector capability and the dispatcher that runs the enabled set.

use crate::detectors::{
    DriverFlagsDetector, OffTrackDetector, PitEntryStatistics, RandomDetector, StoppedDetector,
    TowingDetector,
};
use crate::{
    CautionResult, DetectedEvents, DetectionPayload, DetectionResult, DetectorSettings,
    DetectorState, IncidentType,
};
use caution_telemetry::DriverField;
use core::time::Duration;
use std::collections::BTreeMap;

/// A classifier that turns one telemetry tick into a [`DetectionResult`].
pub trait Detector: Send {
    /// Classify the current tick.
    fn detect(&mut self, field: &DriverField) -> DetectionResult;

    /// Whether the detector should run given the race clock and caution
    /// history. Detectors without constraints always run.
    fn should_run(&self, _state: &DetectorState) -> bool {
        true
    }

    /// Pit-entry statistics, for detectors that learn them.
    fn pit_entry_statistics(&self) -> Option<PitEntryStatistics> {
        None
    }
}

/// Runs every registered detector that is eligible on a tick.
///
/// Nothing runs until [`DetectorDispatcher::on_race_started`] provides the
/// race-start reference; time-relative detectors cannot be evaluated
/// without it.
pub struct DetectorDispatcher {
    detectors: BTreeMap<IncidentType, Box<dyn Detector>>,
    race_start: Option<Duration>,
    state: DetectorState,
}

impl core::fmt::Debug for DetectorDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DetectorDispatcher")
            .field("detectors", &self.detectors.keys().collect::<Vec<_>>())
            .field("race_start", &self.race_start)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for DetectorDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorDispatcher {
    /// Create a dispatcher with no detectors.
    pub fn new() -> Self {
        Self {
            detectors: BTreeMap::new(),
            race_start: None,
            state: DetectorState::default(),
        }
    }

    /// Build the enabled detector set from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn from_settings(settings: &DetectorSettings) -> CautionResult<Self> {
        settings.validate()?;
        let mut dispatcher = Self::new();

        if settings.random_enabled {
            dispatcher.register(
                IncidentType::Random,
                Box::new(RandomDetector::new(
                    settings.random_probability,
                    settings.random_start_minute,
                    settings.random_end_minute,
                    settings.random_max_occurrences,
                )),
            );
        }
        if settings.stopped_enabled {
            dispatcher.register(IncidentType::Stopped, Box::new(StoppedDetector::new()));
        }
        if settings.off_track_enabled {
            dispatcher.register(IncidentType::OffTrack, Box::new(OffTrackDetector::new()));
        }
        if settings.towing_enabled {
            dispatcher.register(
                IncidentType::Towing,
                Box::new(TowingDetector::new(
                    settings.max_pit_entry_delta,
                    settings.min_pit_entry_observations,
                )),
            );
        }
        if settings.driver_flags_enabled {
            dispatcher.register(IncidentType::DriverFlags, Box::new(DriverFlagsDetector::new()));
        }

        tracing::info!(
            detectors = ?dispatcher.detectors.keys().collect::<Vec<_>>(),
            "Detector set built"
        );
        Ok(dispatcher)
    }

    /// Register a detector, replacing any detector already bound to the type.
    pub fn register(&mut self, incident_type: IncidentType, detector: Box<dyn Detector>) {
        if self.detectors.insert(incident_type, detector).is_some() {
            tracing::debug!(incident = %incident_type, "Replaced detector");
        }
    }

    /// Whether a detector is bound to `incident_type`.
    pub fn is_registered(&self, incident_type: IncidentType) -> bool {
        self.detectors.contains_key(&incident_type)
    }

    /// Number of registered detectors.
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// True when no detector is registered.
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Record the session time at which the race went green. Only the first
    /// call takes effect.
    pub fn on_race_started(&mut self, start_time: Duration) {
        match self.race_start {
            None => {
                tracing::info!(start = ?start_time, "Race started, detectors armed");
                self.race_start = Some(start_time);
            }
            Some(started_at) => {
                tracing::debug!(
                    started_at = ?started_at,
                    ignored = ?start_time,
                    "Detectors already armed"
                );
            }
        }
    }

    /// Whether the race-start reference is known.
    pub fn is_race_started(&self) -> bool {
        self.race_start.is_some()
    }

    /// Count a safety car thrown because of `incident_type`.
    pub fn record_safety_car_event(&mut self, incident_type: IncidentType) {
        self.state.increment_safety_car_event(incident_type);
    }

    /// Runtime state as of the last tick.
    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    /// Pit-entry statistics from the towing detector, if registered.
    pub fn pit_entry_statistics(&self) -> Option<PitEntryStatistics> {
        self.detectors
            .get(&IncidentType::Towing)
            .and_then(|d| d.pit_entry_statistics())
    }

    /// Run every eligible detector on the current tick.
    ///
    /// Returns an empty bundle before the race has started.
    pub fn run_tick(&mut self, field: &DriverField) -> DetectedEvents {
        let Some(start) = self.race_start else {
            tracing::debug!("Race not started, skipping detectors");
            return DetectedEvents::new();
        };

        self.state.time_since_race_start = field.session_time().saturating_sub(start);

        let mut events = DetectedEvents::new();
        for (incident_type, detector) in &mut self.detectors {
            if !detector.should_run(&self.state) {
                continue;
            }
            let result = detector.detect(field);
            if result.incident_type() != *incident_type {
                tracing::warn!(
                    registered = %incident_type,
                    reported = %result.incident_type(),
                    "Detector reported a different incident type"
                );
            }
            events.insert(rekey(result, *incident_type));
        }
        events
    }
}

fn rekey(result: DetectionResult, incident_type: IncidentType) -> DetectionResult {
    if result.incident_type() == incident_type {
        return result;
    }
    match result.payload() {
        DetectionPayload::Drivers(drivers) => {
            DetectionResult::drivers(incident_type, drivers.clone())
        }
        DetectionPayload::Flag(flag) => DetectionResult::flag(incident_type, *flag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caution_telemetry::{DriverId, DriverSnapshot, TrackLocation};

    struct Fixed(DetectionResult, bool);

    impl Detector for Fixed {
        fn detect(&mut self, _field: &DriverField) -> DetectionResult {
            self.0.clone()
        }

        fn should_run(&self, _state: &DetectorState) -> bool {
            self.1
        }
    }

    fn off_track_field(secs: u64) -> DriverField {
        DriverField::from_ticks(
            Vec::new(),
            vec![DriverSnapshot::new(DriverId(4)).with_track_location(TrackLocation::OffTrack)],
            Duration::from_secs(secs),
        )
    }

    #[test]
    fn nothing_runs_before_race_start() {
        let mut dispatcher = DetectorDispatcher::new();
        dispatcher.register(IncidentType::OffTrack, Box::new(OffTrackDetector::new()));
        assert!(dispatcher.run_tick(&off_track_field(5)).is_empty());
    }

    #[test]
    fn runs_detectors_after_race_start() {
        let mut dispatcher = DetectorDispatcher::new();
        dispatcher.register(IncidentType::OffTrack, Box::new(OffTrackDetector::new()));
        dispatcher.on_race_started(Duration::from_secs(100));

        let events = dispatcher.run_tick(&off_track_field(130));
        assert_eq!(events.len(), 1);
        assert!(events.get(IncidentType::OffTrack).is_some_and(DetectionResult::is_detected));
        assert_eq!(dispatcher.state().time_since_race_start, Duration::from_secs(30));
    }

    #[test]
    fn repeated_race_start_keeps_first_reference() {
        let mut dispatcher = DetectorDispatcher::new();
        dispatcher.register(IncidentType::OffTrack, Box::new(OffTrackDetector::new()));
        dispatcher.on_race_started(Duration::from_secs(10));
        dispatcher.on_race_started(Duration::from_secs(500));

        dispatcher.run_tick(&off_track_field(600));
        assert_eq!(dispatcher.state().time_since_race_start, Duration::from_secs(590));
    }

    #[test]
    fn skips_detectors_that_decline() {
        let mut dispatcher = DetectorDispatcher::new();
        dispatcher.register(
            IncidentType::Random,
            Box::new(Fixed(DetectionResult::flag(IncidentType::Random, true), false)),
        );
        dispatcher.register(
            IncidentType::Stopped,
            Box::new(Fixed(DetectionResult::drivers(IncidentType::Stopped, Vec::new()), true)),
        );
        dispatcher.on_race_started(Duration::ZERO);

        let events = dispatcher.run_tick(&off_track_field(1));
        assert!(events.get(IncidentType::Random).is_none());
        assert!(events.get(IncidentType::Stopped).is_some());
    }

    #[test]
    fn results_are_keyed_by_registration() {
        let mut dispatcher = DetectorDispatcher::new();
        dispatcher.register(
            IncidentType::Towing,
            Box::new(Fixed(DetectionResult::flag(IncidentType::Random, true), true)),
        );
        dispatcher.on_race_started(Duration::ZERO);

        let events = dispatcher.run_tick(&off_track_field(1));
        assert_eq!(
            events.get(IncidentType::Towing).map(DetectionResult::incident_type),
            Some(IncidentType::Towing)
        );
    }

    #[test]
    fn from_settings_builds_enabled_set() -> CautionResult<()> {
        let settings = DetectorSettings::builder()
            .random(0.5, 0.0, 10.0)
            .towing(true)
            .off_track(false)
            .build()?;
        let dispatcher = DetectorDispatcher::from_settings(&settings)?;

        assert!(dispatcher.is_registered(IncidentType::Random));
        assert!(dispatcher.is_registered(IncidentType::Stopped));
        assert!(dispatcher.is_registered(IncidentType::Towing));
        assert!(!dispatcher.is_registered(IncidentType::OffTrack));
        assert!(!dispatcher.is_registered(IncidentType::DriverFlags));
        assert_eq!(dispatcher.pit_entry_statistics(), Some(PitEntryStatistics::default()));
        Ok(())
    }

    #[test]
    fn safety_car_counts_reach_detectors() {
        let mut dispatcher = DetectorDispatcher::new();
        dispatcher.record_safety_car_event(IncidentType::Random);
        assert_eq!(dispatcher.state().event_count(IncidentType::Random), 1);
    }
}
