//! Cars that have left the racing surface.

use crate::{DetectionResult, Detector, IncidentType};
use caution_telemetry::{DriverField, DriverSnapshot, TrackLocation};

/// Flags every active competitor whose track location is off track.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffTrackDetector;

impl OffTrackDetector {
    /// Create the detector.
    pub fn new() -> Self {
        Self
    }
}

impl Detector for OffTrackDetector {
    fn detect(&mut self, field: &DriverField) -> DetectionResult {
        let off_track: Vec<DriverSnapshot> = field
            .current()
            .iter()
            .filter(|d| d.is_competitor() && d.track_location == TrackLocation::OffTrack)
            .copied()
            .collect();

        if !off_track.is_empty() {
            tracing::debug!(count = off_track.len(), "Cars off track");
        }

        DetectionResult::drivers(IncidentType::OffTrack, off_track)
    }
}
