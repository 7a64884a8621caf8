//! Runtime state handed to detectors when deciding whether to run.

use crate::IncidentType;
use core::time::Duration;
use std::collections::BTreeMap;

/// Race clock and caution history at the time of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorState {
    /// Time elapsed since the race went green.
    pub time_since_race_start: Duration,
    /// Safety cars already thrown per incident type.
    pub safety_car_event_counts: BTreeMap<IncidentType, u32>,
}

impl DetectorState {
    /// Create a state with no caution history.
    pub fn new(time_since_race_start: Duration) -> Self {
        Self {
            time_since_race_start,
            safety_car_event_counts: BTreeMap::new(),
        }
    }

    /// Count one more safety car caused by `incident_type`.
    pub fn increment_safety_car_event(&mut self, incident_type: IncidentType) {
        let count = self.safety_car_event_counts.entry(incident_type).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Safety cars already thrown for `incident_type`.
    pub fn event_count(&self, incident_type: IncidentType) -> u32 {
        self.safety_car_event_counts
            .get(&incident_type)
            .copied()
            .unwrap_or(0)
    }

    /// Safety cars thrown for any reason.
    pub fn total_events(&self) -> u32 {
        self.safety_car_event_counts
            .values()
            .fold(0u32, |acc, n| acc.saturating_add(*n))
    }
}
