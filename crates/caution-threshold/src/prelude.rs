//! Common imports for hosts driving the caution engine.

pub use crate::{
    IncidentMonitor, RacePhase, ThresholdEngine, ThresholdSettings, TriggerDecision,
    TriggerReason,
};
pub use caution_detection::prelude::*;
pub use caution_telemetry::{DriverField, DriverId, DriverSnapshot, SessionFlags, TrackLocation};
