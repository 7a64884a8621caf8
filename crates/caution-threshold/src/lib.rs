//! Safety-car decisions from windowed incident observations.
//!
//! The [`ThresholdEngine`] keeps every detection registered in the last
//! `time_range` of session time, collapses repeats to the latest observation
//! per driver and incident type, groups the survivors by track proximity and
//! checks each group against per-type and weighted accumulative thresholds.
//! Early in a race the thresholds may be scaled down by a dynamic multiplier.
//!
//! [`IncidentMonitor`] wires a [`caution_detection::DetectorDispatcher`] to an
//! engine and runs the whole pipeline for one telemetry tick.
//!
//! # Example
//!
//! ```
//! use caution_detection::{DetectionResult, IncidentType};
//! use caution_telemetry::{DriverId, DriverSnapshot};
//! use caution_threshold::{ThresholdEngine, ThresholdSettings};
//! use std::time::Duration;
//!
//! let settings = ThresholdSettings::builder()
//!     .threshold(IncidentType::OffTrack, 2.0)
//!     .proximity(0.1)
//!     .build()?;
//! let mut engine = ThresholdEngine::new(settings)?;
//! engine.race_started(Duration::ZERO);
//! engine.update_time(Duration::from_secs(42));
//!
//! let drivers = vec![
//!     DriverSnapshot::new(DriverId(3)).with_lap_distance(0.40),
//!     DriverSnapshot::new(DriverId(8)).with_lap_distance(0.43),
//! ];
//! engine.register(&DetectionResult::drivers(IncidentType::OffTrack, drivers));
//! engine.clean_up_events();
//! assert!(engine.threshold_met());
//! # Ok::<(), caution_detection::CautionError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod cluster;
mod engine;
mod monitor;
pub mod prelude;
mod settings;
mod window;

pub use cluster::proximity_clusters;
pub use engine::{RacePhase, ThresholdEngine, TriggerDecision, TriggerReason};
pub use monitor::IncidentMonitor;
pub use settings::{
    DynamicThresholdSettings, ProximitySettings, RANDOM_THRESHOLD, RANDOM_WEIGHT,
    ThresholdSettings, ThresholdSettingsBuilder,
};
pub use window::{EventWindow, WindowedEvent};
