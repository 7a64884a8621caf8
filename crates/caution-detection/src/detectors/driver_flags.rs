//! Cars carrying damage session flags.

use crate::{DetectionResult, Detector, IncidentType};
use caution_telemetry::{DriverField, DriverSnapshot, SessionFlags};

/// Flags active competitors whose session flags intersect a damage mask.
#[derive(Debug, Clone, Copy)]
pub struct DriverFlagsDetector {
    mask: SessionFlags,
}

impl Default for DriverFlagsDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFlagsDetector {
    /// Create a detector watching for the meatball and repair flags.
    pub fn new() -> Self {
        Self::with_mask(SessionFlags::DAMAGE)
    }

    /// Create a detector watching an arbitrary set of flags.
    pub fn with_mask(mask: SessionFlags) -> Self {
        Self { mask }
    }
}

impl Detector for DriverFlagsDetector {
    fn detect(&mut self, field: &DriverField) -> DetectionResult {
        let flagged: Vec<DriverSnapshot> = field
            .current()
            .iter()
            .filter(|d| d.is_competitor() && d.session_flags.intersects(self.mask))
            .copied()
            .collect();

        for driver in &flagged {
            tracing::debug!(
                driver = %driver.driver_id,
                flags = ?driver.session_flags.attention_labels(),
                bits = driver.session_flags.bits(),
                "Driver has damage flags"
            );
        }

        if flagged.is_empty() {
            tracing::debug!(checked = field.len(), "No drivers with damage flags");
        } else {
            tracing::info!(
                count = flagged.len(),
                checked = field.len(),
                "Drivers with damage flags"
            );
        }

        DetectionResult::drivers(IncidentType::DriverFlags, flagged)
    }
}
