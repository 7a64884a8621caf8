//! Incident types and the result contract shared by all detectors.

use caution_telemetry::DriverSnapshot;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of anomaly a detector can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    /// Car left the racing surface.
    OffTrack,
    /// Car made no forward progress since the previous tick.
    Stopped,
    /// Randomly generated hazard with no specific car.
    Random,
    /// Car appeared on pit road away from the pit entry (towed).
    Towing,
    /// Car carries a damage session flag.
    DriverFlags,
}

impl IncidentType {
    /// Every incident type, in a stable order.
    pub const ALL: [IncidentType; 5] = [
        IncidentType::OffTrack,
        IncidentType::Stopped,
        IncidentType::Random,
        IncidentType::Towing,
        IncidentType::DriverFlags,
    ];

    /// Default chat message announced with a caution for this incident.
    pub fn default_message(self) -> &'static str {
        match self {
            IncidentType::OffTrack => "Multiple cars off track",
            IncidentType::Stopped => "Cars stopped on track",
            IncidentType::Random => "Hazard on track.",
            IncidentType::Towing => "Car towed to pit road",
            IncidentType::DriverFlags => "Damaged cars on track",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IncidentType::OffTrack => "off_track",
            IncidentType::Stopped => "stopped",
            IncidentType::Random => "random",
            IncidentType::Towing => "towing",
            IncidentType::DriverFlags => "driver_flags",
        };
        f.write_str(name)
    }
}

/// Payload of a detection: either the offending cars or a bare flag.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionPayload {
    /// Cars that exhibited the incident this tick.
    Drivers(Vec<DriverSnapshot>),
    /// Whether the incident happened, for detectors without a car concept.
    Flag(bool),
}

/// What a detector observed on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    incident_type: IncidentType,
    payload: DetectionPayload,
}

impl DetectionResult {
    /// Result carrying a set of cars.
    pub fn drivers(incident_type: IncidentType, drivers: Vec<DriverSnapshot>) -> Self {
        Self {
            incident_type,
            payload: DetectionPayload::Drivers(drivers),
        }
    }

    /// Result carrying a boolean flag.
    pub fn flag(incident_type: IncidentType, detected: bool) -> Self {
        Self {
            incident_type,
            payload: DetectionPayload::Flag(detected),
        }
    }

    /// The incident type this result reports.
    pub fn incident_type(&self) -> IncidentType {
        self.incident_type
    }

    /// The raw payload.
    pub fn payload(&self) -> &DetectionPayload {
        &self.payload
    }

    /// Offending cars, when this result carries a car set.
    pub fn offending_drivers(&self) -> Option<&[DriverSnapshot]> {
        match &self.payload {
            DetectionPayload::Drivers(drivers) => Some(drivers),
            DetectionPayload::Flag(_) => None,
        }
    }

    /// The flag, when this result carries one.
    pub fn detected_flag(&self) -> Option<bool> {
        match self.payload {
            DetectionPayload::Flag(flag) => Some(flag),
            DetectionPayload::Drivers(_) => None,
        }
    }

    /// True when the result reports at least one observation.
    pub fn is_detected(&self) -> bool {
        match &self.payload {
            DetectionPayload::Drivers(drivers) => !drivers.is_empty(),
            DetectionPayload::Flag(flag) => *flag,
        }
    }
}

/// Results of one dispatcher pass, keyed by incident type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedEvents {
    results: BTreeMap<IncidentType, DetectionResult>,
}

impl DetectedEvents {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a result, replacing any previous result for the same type.
    pub fn insert(&mut self, result: DetectionResult) {
        self.results.insert(result.incident_type(), result);
    }

    /// Result for a given incident type.
    pub fn get(&self, incident_type: IncidentType) -> Option<&DetectionResult> {
        self.results.get(&incident_type)
    }

    /// Iterate over all results in incident type order.
    pub fn iter(&self) -> impl Iterator<Item = &DetectionResult> + '_ {
        self.results.values()
    }

    /// Number of detectors that produced a result.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when no detector ran.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl FromIterator<DetectionResult> for DetectedEvents {
    fn from_iter<I: IntoIterator<Item = DetectionResult>>(iter: I) -> Self {
        let mut events = Self::new();
        for result in iter {
            events.insert(result);
        }
        events
    }
}
