//! Detector configuration.

use crate::detectors::{DEFAULT_MAX_PIT_ENTRY_DELTA, DEFAULT_MIN_OBSERVATIONS};
use crate::error::{CautionError, CautionResult};
use serde::{Deserialize, Serialize};

/// Which detectors run and how they are parameterised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Enable random cautions.
    pub random_enabled: bool,
    /// Probability of at least one random caution across the window.
    pub random_probability: f64,
    /// Race minute at which random cautions may start.
    pub random_start_minute: f64,
    /// Race minute after which random cautions stop.
    pub random_end_minute: f64,
    /// Maximum random cautions per race.
    pub random_max_occurrences: u32,
    /// Enable stopped-car detection.
    pub stopped_enabled: bool,
    /// Enable off-track detection.
    pub off_track_enabled: bool,
    /// Enable pit-entry anomaly (towing) detection.
    pub towing_enabled: bool,
    /// Largest lap-distance jump that still counts as a normal pit entry.
    pub max_pit_entry_delta: f64,
    /// Pit entries to observe before towing can be flagged.
    pub min_pit_entry_observations: usize,
    /// Enable damage-flag detection.
    pub driver_flags_enabled: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            random_enabled: false,
            random_probability: 0.1,
            random_start_minute: 3.0,
            random_end_minute: 30.0,
            random_max_occurrences: 1,
            stopped_enabled: true,
            off_track_enabled: true,
            towing_enabled: false,
            max_pit_entry_delta: DEFAULT_MAX_PIT_ENTRY_DELTA,
            min_pit_entry_observations: DEFAULT_MIN_OBSERVATIONS,
            driver_flags_enabled: false,
        }
    }
}

impl DetectorSettings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a probability, time window or pit-entry delta is
    /// out of range.
    pub fn validate(&self) -> CautionResult<()> {
        CautionError::ensure_within("random_probability", self.random_probability, 0.0, 1.0)?;
        CautionError::ensure_within(
            "random_start_minute",
            self.random_start_minute,
            0.0,
            f64::MAX,
        )?;
        if self.random_end_minute.is_nan() || self.random_end_minute < self.random_start_minute {
            return Err(CautionError::invalid_configuration(
                "random_end_minute must not precede random_start_minute",
            ));
        }
        if !(self.max_pit_entry_delta > 0.0 && self.max_pit_entry_delta < 0.5) {
            return Err(CautionError::out_of_range(
                "max_pit_entry_delta",
                self.max_pit_entry_delta,
                0.0,
                0.5,
            ));
        }
        Ok(())
    }

    /// Create a settings builder.
    #[must_use]
    pub fn builder() -> DetectorSettingsBuilder {
        DetectorSettingsBuilder::default()
    }
}

/// Builder for [`DetectorSettings`].
#[derive(Debug, Default)]
pub struct DetectorSettingsBuilder {
    settings: DetectorSettings,
}

impl DetectorSettingsBuilder {
    /// Enable random cautions with a probability over a minute window.
    #[must_use]
    pub fn random(mut self, probability: f64, start_minute: f64, end_minute: f64) -> Self {
        self.settings.random_enabled = true;
        self.settings.random_probability = probability;
        self.settings.random_start_minute = start_minute;
        self.settings.random_end_minute = end_minute;
        self
    }

    /// Cap the number of random cautions.
    #[must_use]
    pub fn random_max_occurrences(mut self, max: u32) -> Self {
        self.settings.random_max_occurrences = max;
        self
    }

    /// Enable or disable stopped-car detection.
    #[must_use]
    pub fn stopped(mut self, enabled: bool) -> Self {
        self.settings.stopped_enabled = enabled;
        self
    }

    /// Enable or disable off-track detection.
    #[must_use]
    pub fn off_track(mut self, enabled: bool) -> Self {
        self.settings.off_track_enabled = enabled;
        self
    }

    /// Enable or disable towing detection.
    #[must_use]
    pub fn towing(mut self, enabled: bool) -> Self {
        self.settings.towing_enabled = enabled;
        self
    }

    /// Set the normal pit-entry delta.
    #[must_use]
    pub fn max_pit_entry_delta(mut self, delta: f64) -> Self {
        self.settings.max_pit_entry_delta = delta;
        self
    }

    /// Set the observations needed before a tow can be flagged.
    #[must_use]
    pub fn min_pit_entry_observations(mut self, count: usize) -> Self {
        self.settings.min_pit_entry_observations = count;
        self
    }

    /// Enable or disable damage-flag detection.
    #[must_use]
    pub fn driver_flags(mut self, enabled: bool) -> Self {
        self.settings.driver_flags_enabled = enabled;
        self
    }

    /// Build and validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> CautionResult<DetectorSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DetectorSettings::default().validate().is_ok());
    }

    #[test]
    fn builder_enables_random() -> CautionResult<()> {
        let settings = DetectorSettings::builder()
            .random(0.5, 0.0, 60.0)
            .random_max_occurrences(2)
            .towing(true)
            .build()?;
        assert!(settings.random_enabled);
        assert!(settings.towing_enabled);
        assert_eq!(settings.random_max_occurrences, 2);
        Ok(())
    }

    #[test]
    fn rejects_bad_probability() {
        let err = DetectorSettings::builder().random(1.5, 0.0, 10.0).build();
        assert!(matches!(err, Err(CautionError::OutOfRange { .. })));
    }

    #[test]
    fn rejects_inverted_window() {
        let err = DetectorSettings::builder().random(0.5, 20.0, 10.0).build();
        assert!(matches!(err, Err(CautionError::InvalidConfiguration(_))));
    }

    #[test]
    fn rejects_bad_pit_delta() {
        assert!(DetectorSettings::builder().max_pit_entry_delta(0.0).build().is_err());
        assert!(DetectorSettings::builder().max_pit_entry_delta(0.6).build().is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() -> Result<(), serde_json::Error> {
        let settings: DetectorSettings = serde_json::from_str(r#"{"random_enabled": true}"#)?;
        assert!(settings.random_enabled);
        assert!(settings.stopped_enabled);
        assert_eq!(settings.min_pit_entry_observations, DEFAULT_MIN_OBSERVATIONS);
        Ok(())
    }
}
