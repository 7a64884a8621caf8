//! Time-windowed incident log.

use caution_detection::IncidentType;
use caution_telemetry::{DriverId, DriverSnapshot};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

/// One observation of an incident for one driver.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedEvent {
    /// Session time at which the observation was registered.
    pub timestamp: Duration,
    /// What was observed.
    pub incident_type: IncidentType,
    /// The driver as seen on that tick.
    pub driver: DriverSnapshot,
}

impl WindowedEvent {
    /// Identity under which repeated observations collapse.
    pub fn key(&self) -> (DriverId, IncidentType) {
        (self.driver.driver_id, self.incident_type)
    }
}

/// FIFO of timestamped observations with a presence count per
/// `(driver, incident type)`.
///
/// Observations arrive in session-time order, so the oldest is always at the
/// front and eviction only ever pops from there.
#[derive(Debug, Clone, Default)]
pub struct EventWindow {
    events: VecDeque<WindowedEvent>,
    presence: HashMap<(DriverId, IncidentType), u32>,
}

impl EventWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation.
    pub fn push(&mut self, event: WindowedEvent) {
        let count = self.presence.entry(event.key()).or_insert(0);
        *count = count.saturating_add(1);
        self.events.push_back(event);
    }

    /// Drop every observation at least `time_range` old at `now`.
    ///
    /// Returns how many were evicted.
    pub fn evict_older_than(&mut self, now: Duration, time_range: Duration) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.events.front()
            && now.saturating_sub(front.timestamp) >= time_range
        {
            let Some(event) = self.events.pop_front() else {
                break;
            };
            evicted += 1;
            tracing::debug!(
                incident = %event.incident_type,
                driver = %event.driver.driver_id,
                registered_at = ?event.timestamp,
                "Evicting event"
            );
            self.release(event.key());
        }
        evicted
    }

    fn release(&mut self, key: (DriverId, IncidentType)) {
        match self.presence.get_mut(&key) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.presence.remove(&key);
            }
            None => {
                tracing::warn!(
                    driver = %key.0,
                    incident = %key.1,
                    "Evicted event missing from presence map"
                );
            }
        }
    }

    /// The most recent observation per `(driver, incident type)`.
    pub fn latest(&self) -> Vec<&WindowedEvent> {
        let mut latest: BTreeMap<(DriverId, IncidentType), &WindowedEvent> = BTreeMap::new();
        for event in &self.events {
            latest.insert(event.key(), event);
        }
        latest.into_values().collect()
    }

    /// Distinct drivers currently holding a live observation of `incident_type`.
    pub fn distinct_drivers(&self, incident_type: IncidentType) -> usize {
        self.presence
            .keys()
            .filter(|(_, ty)| *ty == incident_type)
            .count()
    }

    /// Live observations of `(driver, incident type)`.
    pub fn presence(&self, driver_id: DriverId, incident_type: IncidentType) -> u32 {
        self.presence
            .get(&(driver_id, incident_type))
            .copied()
            .unwrap_or(0)
    }

    /// Number of observations held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.events.clear();
        self.presence.clear();
    }

    /// Observations oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &WindowedEvent> + '_ {
        self.events.iter()
    }

    #[cfg(test)]
    fn forget_presence(&mut self, key: (DriverId, IncidentType)) {
        self.presence.remove(&key);
    }
}
