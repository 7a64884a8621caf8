//! Common imports for detector users.

pub use crate::detectors::{
    DriverFlagsDetector, OffTrackDetector, PitEntryStatistics, RandomDetector, StoppedDetector,
    TowingDetector,
};
pub use crate::{
    CautionError, CautionResult, DetectedEvents, DetectionPayload, DetectionResult, Detector,
    DetectorDispatcher, DetectorSettings, DetectorState, IncidentType,
};
