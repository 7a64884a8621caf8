//! Threshold configuration.

use caution_detection::{CautionError, CautionResult, IncidentType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Weight the random hazard always contributes to the accumulative score.
pub const RANDOM_WEIGHT: f64 = 0.0;

/// Per-type threshold the random hazard is always evaluated against.
pub const RANDOM_THRESHOLD: f64 = 1.0;

/// Proximity clustering of incidents around the lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximitySettings {
    /// Cluster incidents by track position.
    pub enabled: bool,
    /// Largest lap fraction between the first and last member of a cluster.
    pub distance: f64,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            distance: 0.25,
        }
    }
}

/// Lowered thresholds for the opening phase of a race.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicThresholdSettings {
    /// Scale thresholds early in the race.
    pub enabled: bool,
    /// Factor applied to every threshold while active.
    pub multiplier: f64,
    /// How long after the start the multiplier applies.
    pub active_duration: Duration,
}

impl Default for DynamicThresholdSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            multiplier: 1.0,
            active_duration: Duration::from_secs(30),
        }
    }
}

/// When the threshold engine signals a safety car.
///
/// Entries for [`IncidentType::Random`] in either map are ignored: the random
/// hazard always weighs [`RANDOM_WEIGHT`] and triggers at [`RANDOM_THRESHOLD`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSettings {
    /// How long an observation stays in the window.
    pub time_range: Duration,
    /// Weighted score at which any mix of incidents triggers.
    pub accumulative_threshold: f64,
    /// Contribution of one incident of each type to the weighted score.
    pub accumulative_weights: BTreeMap<IncidentType, f64>,
    /// Distinct drivers per type needed to trigger on that type alone.
    pub event_type_thresholds: BTreeMap<IncidentType, f64>,
    /// Proximity clustering.
    pub proximity: ProximitySettings,
    /// Dynamic thresholds.
    pub dynamic: DynamicThresholdSettings,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            time_range: Duration::from_secs(10),
            accumulative_threshold: 10.0,
            accumulative_weights: BTreeMap::from([
                (IncidentType::OffTrack, 1.0),
                (IncidentType::Stopped, 2.0),
                (IncidentType::Towing, 1.0),
                (IncidentType::DriverFlags, 1.0),
            ]),
            event_type_thresholds: BTreeMap::from([
                (IncidentType::OffTrack, 4.0),
                (IncidentType::Stopped, 2.0),
                (IncidentType::Towing, 1.0),
                (IncidentType::DriverFlags, 3.0),
            ]),
            proximity: ProximitySettings::default(),
            dynamic: DynamicThresholdSettings::default(),
        }
    }
}

impl ThresholdSettings {
    /// Create a settings builder.
    #[must_use]
    pub fn builder() -> ThresholdSettingsBuilder {
        ThresholdSettingsBuilder::default()
    }

    /// Effective accumulative weight for `incident_type`.
    ///
    /// Unconfigured types contribute nothing.
    pub fn weight(&self, incident_type: IncidentType) -> f64 {
        match incident_type {
            IncidentType::Random => RANDOM_WEIGHT,
            other => self
                .accumulative_weights
                .get(&other)
                .copied()
                .unwrap_or(0.0),
        }
    }

    /// Effective per-type threshold for `incident_type`, before scaling.
    ///
    /// Unconfigured types never trigger on their own.
    pub fn threshold(&self, incident_type: IncidentType) -> f64 {
        match incident_type {
            IncidentType::Random => RANDOM_THRESHOLD,
            other => self
                .event_type_thresholds
                .get(&other)
                .copied()
                .unwrap_or(f64::INFINITY),
        }
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero time range, a negative weight, a proximity
    /// distance out of range, or a threshold or multiplier that is not a
    /// positive finite number.
    pub fn validate(&self) -> CautionResult<()> {
        if self.time_range.is_zero() {
            return Err(CautionError::invalid_configuration(
                "time_range must be greater than zero",
            ));
        }
        ensure_positive("accumulative_threshold", self.accumulative_threshold)?;

        for (incident_type, weight) in &self.accumulative_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(CautionError::out_of_range(
                    format!("accumulative_weights.{incident_type}"),
                    *weight,
                    0.0,
                    f64::MAX,
                ));
            }
        }
        for (incident_type, threshold) in &self.event_type_thresholds {
            ensure_positive(&format!("event_type_thresholds.{incident_type}"), *threshold)?;
        }

        if !(self.proximity.distance > 0.0 && self.proximity.distance <= 0.5) {
            return Err(CautionError::out_of_range(
                "proximity.distance",
                self.proximity.distance,
                0.0,
                0.5,
            ));
        }
        ensure_positive("dynamic.multiplier", self.dynamic.multiplier)?;
        Ok(())
    }
}

fn ensure_positive(field: &str, value: f64) -> CautionResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CautionError::out_of_range(field, value, 0.0, f64::MAX))
    }
}

/// Builder for [`ThresholdSettings`].
#[derive(Debug, Default)]
pub struct ThresholdSettingsBuilder {
    settings: ThresholdSettings,
}

impl ThresholdSettingsBuilder {
    /// Set how long observations stay in the window.
    #[must_use]
    pub fn time_range(mut self, time_range: Duration) -> Self {
        self.settings.time_range = time_range;
        self
    }

    /// Set the accumulative score threshold.
    #[must_use]
    pub fn accumulative_threshold(mut self, threshold: f64) -> Self {
        self.settings.accumulative_threshold = threshold;
        self
    }

    /// Set the accumulative weight of one incident type.
    #[must_use]
    pub fn weight(mut self, incident_type: IncidentType, weight: f64) -> Self {
        self.settings
            .accumulative_weights
            .insert(incident_type, weight);
        self
    }

    /// Set the per-type threshold of one incident type.
    #[must_use]
    pub fn threshold(mut self, incident_type: IncidentType, threshold: f64) -> Self {
        self.settings
            .event_type_thresholds
            .insert(incident_type, threshold);
        self
    }

    /// Cluster incidents that lie within `distance` of each other.
    #[must_use]
    pub fn proximity(mut self, distance: f64) -> Self {
        self.settings.proximity = ProximitySettings {
            enabled: true,
            distance,
        };
        self
    }

    /// Treat every live incident as one cluster.
    #[must_use]
    pub fn without_proximity(mut self) -> Self {
        self.settings.proximity.enabled = false;
        self
    }

    /// Scale thresholds by `multiplier` for `active_duration` after the start.
    #[must_use]
    pub fn dynamic(mut self, multiplier: f64, active_duration: Duration) -> Self {
        self.settings.dynamic = DynamicThresholdSettings {
            enabled: true,
            multiplier,
            active_duration,
        };
        self
    }

    /// Build and validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> CautionResult<ThresholdSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
