//! Incident detection for the caution engine.
//!
//! Each [`Detector`] classifies one telemetry tick into a [`DetectionResult`]:
//! either the set of offending drivers or a plain triggered flag. The
//! [`DetectorDispatcher`] owns the enabled detectors, keeps the race clock and
//! the per-type caution history, and returns the bundle of results produced
//! on each tick.
//!
//! # Detectors
//!
//! - [`detectors::OffTrackDetector`]: competitors reported off the racing surface
//! - [`detectors::StoppedDetector`]: competitors that made no forward progress
//! - [`detectors::TowingDetector`]: pit-road entries far from the learned pit entry
//! - [`detectors::RandomDetector`]: a time-windowed random hazard
//! - [`detectors::DriverFlagsDetector`]: competitors carrying damage flags
//!
//! # Example
//!
//! ```
//! use caution_detection::prelude::*;
//! use caution_telemetry::{DriverField, DriverId, DriverSnapshot, TrackLocation};
//! use std::time::Duration;
//!
//! let mut dispatcher = DetectorDispatcher::from_settings(&DetectorSettings::default())?;
//! dispatcher.on_race_started(Duration::from_secs(0));
//!
//! let field = DriverField::from_ticks(
//!     Vec::new(),
//!     vec![DriverSnapshot::new(DriverId(7)).with_track_location(TrackLocation::OffTrack)],
//!     Duration::from_secs(60),
//! );
//! let events = dispatcher.run_tick(&field);
//! assert!(events.get(IncidentType::OffTrack).is_some_and(|r| r.is_detected()));
//! # Ok::<(), CautionError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod detector;
pub mod detectors;
mod error;
mod incident;
pub mod prelude;
mod settings;
mod state;

pub use detector::{Detector, DetectorDispatcher};
pub use detectors::PitEntryStatistics;
pub use error::{CautionError, CautionResult};
pub use incident::{DetectedEvents, DetectionPayload, DetectionResult, IncidentType};
pub use settings::{DetectorSettings, DetectorSettingsBuilder};
pub use state::DetectorState;
