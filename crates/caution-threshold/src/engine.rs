//! Threshold engine: windowed aggregation and the safety-car decision.

use crate::cluster::proximity_clusters;
use crate::settings::ThresholdSettings;
use crate::window::{EventWindow, WindowedEvent};
use caution_detection::{
    CautionResult, DetectedEvents, DetectionPayload, DetectionResult, IncidentType,
};
use caution_telemetry::{DriverId, DriverSnapshot};
use core::fmt;
use std::collections::BTreeMap;
use std::time::Duration;

/// Race lifecycle as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    /// No race-start reference yet.
    AwaitingRaceStart,
    /// Racing since `started_at` session time.
    Active {
        /// Session time at the green flag.
        started_at: Duration,
    },
}

/// Which condition crossed its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerReason {
    /// Distinct drivers of one incident type reached that type's threshold.
    IncidentType {
        /// The incident type.
        incident_type: IncidentType,
        /// Distinct drivers counted in the cluster.
        count: u32,
    },
    /// The weighted score reached the accumulative threshold.
    Accumulative {
        /// Weighted score of the cluster.
        score: f64,
    },
}

/// A positive safety-car decision and what caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDecision {
    /// The condition that was met.
    pub reason: TriggerReason,
    /// Multiplier the thresholds were scaled by.
    pub multiplier: f64,
    /// Observations in the cluster that crossed the threshold.
    pub cluster: Vec<(IncidentType, DriverSnapshot)>,
}

impl TriggerDecision {
    /// The incident type responsible, if a single type triggered.
    pub fn incident_type(&self) -> Option<IncidentType> {
        match self.reason {
            TriggerReason::IncidentType { incident_type, .. } => Some(incident_type),
            TriggerReason::Accumulative { .. } => None,
        }
    }

    /// Chat message to announce with the caution.
    pub fn message(&self) -> &'static str {
        self.incident_type()
            .map_or("Multiple incidents on track", IncidentType::default_message)
    }

    /// Real cars involved, excluding synthetic observations.
    pub fn drivers(&self) -> impl Iterator<Item = &DriverSnapshot> + '_ {
        self.cluster
            .iter()
            .map(|(_, driver)| driver)
            .filter(|driver| !driver.driver_id.is_sentinel())
    }
}

impl fmt::Display for TriggerDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            TriggerReason::IncidentType {
                incident_type,
                count,
            } => write!(f, "{incident_type} threshold met with {count} drivers")?,
            TriggerReason::Accumulative { score } => {
                write!(f, "accumulative threshold met with score {score:.2}")?;
            }
        }
        write!(f, " (multiplier {:.2})", self.multiplier)
    }
}

/// Aggregates detections over a sliding time window and decides when a
/// safety car is due.
///
/// The engine is driven by session time: call [`ThresholdEngine::update_time`]
/// every tick before registering detections or evaluating.
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    settings: ThresholdSettings,
    window: EventWindow,
    phase: RacePhase,
    now: Duration,
}

impl ThresholdEngine {
    /// Create an engine awaiting the race start.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(settings: ThresholdSettings) -> CautionResult<Self> {
        settings.validate()?;
        tracing::info!(?settings, "Threshold engine initialized");
        Ok(Self {
            settings,
            window: EventWindow::new(),
            phase: RacePhase::AwaitingRaceStart,
            now: Duration::ZERO,
        })
    }

    /// The settings in force.
    pub fn settings(&self) -> &ThresholdSettings {
        &self.settings
    }

    /// Current race phase.
    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    /// Current session time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// The observation window.
    pub fn window(&self) -> &EventWindow {
        &self.window
    }

    /// Mark the green flag. Only the first call takes effect.
    pub fn race_started(&mut self, start_time: Duration) {
        match self.phase {
            RacePhase::AwaitingRaceStart => {
                tracing::info!(start = ?start_time, "Race started");
                self.phase = RacePhase::Active {
                    started_at: start_time,
                };
            }
            RacePhase::Active { started_at } => {
                tracing::debug!(
                    started_at = ?started_at,
                    ignored = ?start_time,
                    "Race already started"
                );
            }
        }
    }

    /// Advance the session clock.
    pub fn update_time(&mut self, now: Duration) {
        self.now = now;
    }

    /// Time since the green flag, if the race has started.
    pub fn elapsed_since_start(&self) -> Option<Duration> {
        match self.phase {
            RacePhase::AwaitingRaceStart => None,
            RacePhase::Active { started_at } => Some(self.now.saturating_sub(started_at)),
        }
    }

    /// Factor currently applied to every threshold.
    ///
    /// The configured multiplier while dynamic thresholds are enabled and the
    /// race is younger than the active duration; `1.0` otherwise, including
    /// before the race has started.
    pub fn dynamic_multiplier(&self) -> f64 {
        let dynamic = &self.settings.dynamic;
        if !dynamic.enabled {
            return 1.0;
        }
        match self.elapsed_since_start() {
            Some(elapsed) if elapsed < dynamic.active_duration => dynamic.multiplier,
            _ => 1.0,
        }
    }

    /// Record one observation per offending driver, or a single synthetic
    /// observation for a raised flag.
    pub fn register(&mut self, result: &DetectionResult) {
        let incident_type = result.incident_type();
        match result.payload() {
            DetectionPayload::Drivers(drivers) => {
                for driver in drivers {
                    self.push(incident_type, *driver);
                }
            }
            DetectionPayload::Flag(true) => {
                self.push(incident_type, DriverSnapshot::new(DriverId::SENTINEL));
            }
            DetectionPayload::Flag(false) => {}
        }
    }

    /// Register every result of a tick.
    pub fn register_events(&mut self, events: &DetectedEvents) {
        for result in events.iter() {
            self.register(result);
        }
    }

    fn push(&mut self, incident_type: IncidentType, driver: DriverSnapshot) {
        tracing::info!(
            incident = %incident_type,
            driver = %driver.driver_id,
            at = ?self.now,
            "Registering event"
        );
        self.window.push(WindowedEvent {
            timestamp: self.now,
            incident_type,
            driver,
        });
    }

    /// Evict observations that have aged out of the window.
    pub fn clean_up_events(&mut self) {
        let evicted = self
            .window
            .evict_older_than(self.now, self.settings.time_range);
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.window.len(), "Cleaned up events");
        }
    }

    /// Whether a safety car should be thrown now.
    pub fn threshold_met(&self) -> bool {
        self.evaluate().is_some()
    }

    /// Evaluate the window and describe the first threshold met, if any.
    pub fn evaluate(&self) -> Option<TriggerDecision> {
        if self.phase == RacePhase::AwaitingRaceStart {
            tracing::warn!("Evaluating thresholds before race start, dynamic scaling disabled");
        }

        let latest = self.window.latest();
        if latest.is_empty() {
            return None;
        }

        let multiplier = self.dynamic_multiplier();
        let clusters = if self.settings.proximity.enabled {
            proximity_clusters(&latest, self.settings.proximity.distance, |event| {
                event.driver.normalized_lap_distance()
            })
        } else {
            vec![latest]
        };

        clusters
            .iter()
            .find_map(|cluster| self.evaluate_cluster(cluster, multiplier))
    }

    fn evaluate_cluster(
        &self,
        cluster: &[&WindowedEvent],
        multiplier: f64,
    ) -> Option<TriggerDecision> {
        let mut counts: BTreeMap<IncidentType, u32> = BTreeMap::new();
        for event in cluster {
            let count = counts.entry(event.incident_type).or_insert(0);
            *count = count.saturating_add(1);
        }

        let decision = |reason: TriggerReason| TriggerDecision {
            reason,
            multiplier,
            cluster: cluster
                .iter()
                .map(|event| (event.incident_type, event.driver))
                .collect(),
        };

        for (&incident_type, &count) in &counts {
            let threshold = self.settings.threshold(incident_type) * multiplier;
            if f64::from(count) >= threshold {
                tracing::info!(
                    incident = %incident_type,
                    count,
                    threshold,
                    "Incident type threshold met"
                );
                return Some(decision(TriggerReason::IncidentType {
                    incident_type,
                    count,
                }));
            }
        }

        let score: f64 = counts
            .iter()
            .map(|(&incident_type, &count)| f64::from(count) * self.settings.weight(incident_type))
            .sum();
        let threshold = self.settings.accumulative_threshold * multiplier;
        if score >= threshold {
            tracing::info!(score, threshold, "Accumulative threshold met");
            return Some(decision(TriggerReason::Accumulative { score }));
        }

        tracing::debug!(score, threshold, ?counts, "Cluster below thresholds");
        None
    }

    /// Drop every observation, keeping the race phase.
    pub fn clear(&mut self) {
        self.window.clear();
    }
}
