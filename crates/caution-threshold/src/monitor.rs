//! One-tick incident pipeline: detectors, window, decision.

use crate::engine::{ThresholdEngine, TriggerDecision};
use crate::settings::ThresholdSettings;
use caution_detection::{CautionResult, DetectorDispatcher, DetectorSettings, PitEntryStatistics};
use caution_telemetry::DriverField;
use std::time::Duration;

/// Runs the detectors on each tick, feeds the threshold engine, and reports
/// when a safety car is due.
///
/// Calls must be serialized by the host; a monitor is not meant to be shared
/// between threads.
#[derive(Debug)]
pub struct IncidentMonitor {
    detector_settings: DetectorSettings,
    dispatcher: DetectorDispatcher,
    engine: ThresholdEngine,
}

impl IncidentMonitor {
    /// Build the enabled detectors and a threshold engine.
    ///
    /// # Errors
    ///
    /// Returns an error if either settings record is invalid.
    pub fn new(
        detector_settings: DetectorSettings,
        threshold_settings: ThresholdSettings,
    ) -> CautionResult<Self> {
        let dispatcher = DetectorDispatcher::from_settings(&detector_settings)?;
        let engine = ThresholdEngine::new(threshold_settings)?;
        Ok(Self {
            detector_settings,
            dispatcher,
            engine,
        })
    }

    /// The detector dispatcher.
    pub fn dispatcher(&self) -> &DetectorDispatcher {
        &self.dispatcher
    }

    /// The threshold engine.
    pub fn engine(&self) -> &ThresholdEngine {
        &self.engine
    }

    /// Arm detectors and thresholds at the green flag.
    pub fn race_started(&mut self, start_time: Duration) {
        self.dispatcher.on_race_started(start_time);
        self.engine.race_started(start_time);
    }

    /// Process one telemetry tick.
    ///
    /// Returns a decision when a threshold is met. Nothing is evaluated
    /// before the race has started.
    pub fn tick(&mut self, field: &DriverField) -> Option<TriggerDecision> {
        if !self.dispatcher.is_race_started() {
            tracing::debug!("Race not started, skipping tick");
            return None;
        }

        self.engine.update_time(field.session_time());
        let events = self.dispatcher.run_tick(field);
        self.engine.register_events(&events);
        self.engine.clean_up_events();

        let decision = self.engine.evaluate()?;
        tracing::info!(%decision, message = decision.message(), "Safety car threshold met");
        Some(decision)
    }

    /// Account for a safety car thrown on `decision`.
    ///
    /// Counts the occurrence toward the responsible incident type and clears
    /// the window so the same incidents do not trigger again.
    pub fn record_safety_car(&mut self, decision: &TriggerDecision) {
        if let Some(incident_type) = decision.incident_type() {
            self.dispatcher.record_safety_car_event(incident_type);
        }
        self.engine.clear();
    }

    /// Pit-entry statistics learned so far.
    pub fn pit_entry_statistics(&self) -> Option<PitEntryStatistics> {
        self.dispatcher.pit_entry_statistics()
    }

    /// Start over for a new session with fresh detector state and an empty
    /// window awaiting the race start.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored settings no longer validate.
    pub fn reset(&mut self) -> CautionResult<()> {
        self.dispatcher = DetectorDispatcher::from_settings(&self.detector_settings)?;
        self.engine = ThresholdEngine::new(self.engine.settings().clone())?;
        tracing::info!("Incident monitor reset");
        Ok(())
    }
}
