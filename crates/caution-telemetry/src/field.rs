//! Current and previous tick of the whole field.

use crate::{DriverId, DriverSnapshot};
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// The full grid as seen on the current and the previous polling tick.
///
/// Snapshots are never mutated once stored; [`DriverField::update`] rotates
/// the current tick into the previous slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverField {
    session_time: Duration,
    current: Vec<DriverSnapshot>,
    previous: Vec<DriverSnapshot>,
}

impl DriverField {
    /// Create an empty field at session time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a field from two explicit ticks.
    pub fn from_ticks(
        previous: Vec<DriverSnapshot>,
        current: Vec<DriverSnapshot>,
        session_time: Duration,
    ) -> Self {
        Self {
            session_time,
            current,
            previous,
        }
    }

    /// Store a new tick, keeping the old one as the previous tick.
    pub fn update(&mut self, drivers: Vec<DriverSnapshot>, session_time: Duration) {
        self.previous = core::mem::replace(&mut self.current, drivers);
        self.session_time = session_time;
    }

    /// Session time of the current tick.
    pub fn session_time(&self) -> Duration {
        self.session_time
    }

    /// Snapshots from the current tick.
    pub fn current(&self) -> &[DriverSnapshot] {
        &self.current
    }

    /// Snapshots from the previous tick.
    pub fn previous(&self) -> &[DriverSnapshot] {
        &self.previous
    }

    /// Number of cars in the current tick.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// True when the current tick holds no cars.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Previous-tick snapshot of a driver.
    ///
    /// The simulator reports cars in `CarIdx` order, so the same slot is
    /// tried first before searching.
    pub fn previous_of(&self, slot: usize, driver_id: DriverId) -> Option<&DriverSnapshot> {
        match self.previous.get(slot) {
            Some(prev) if prev.driver_id == driver_id => Some(prev),
            _ => self.previous.iter().find(|p| p.driver_id == driver_id),
        }
    }

    /// Pairs of `(current, previous)` for every car present in both ticks.
    pub fn paired(&self) -> impl Iterator<Item = (&DriverSnapshot, &DriverSnapshot)> + '_ {
        self.current
            .iter()
            .enumerate()
            .filter_map(|(slot, cur)| self.previous_of(slot, cur.driver_id).map(|prev| (cur, prev)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(id: i32, lap_distance: f64) -> DriverSnapshot {
        DriverSnapshot::new(DriverId(id)).with_lap_distance(lap_distance)
    }

    #[test]
    fn update_rotates_current_into_previous() {
        let mut field = DriverField::new();
        field.update(vec![car(0, 0.1)], Duration::from_secs(1));
        field.update(vec![car(0, 0.2)], Duration::from_secs(2));

        assert_eq!(field.session_time(), Duration::from_secs(2));
        assert_eq!(field.previous().len(), 1);
        assert!(field.previous().iter().all(|p| (p.lap_distance - 0.1).abs() < 1e-12));
        assert!(field.current().iter().all(|c| (c.lap_distance - 0.2).abs() < 1e-12));
    }

    #[test]
    fn first_tick_has_no_pairs() {
        let mut field = DriverField::new();
        field.update(vec![car(0, 0.1), car(1, 0.2)], Duration::ZERO);
        assert_eq!(field.paired().count(), 0);
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn pairing_follows_driver_id_when_slots_shift() {
        let field = DriverField::from_ticks(
            vec![car(1, 0.5), car(2, 0.6)],
            vec![car(2, 0.7), car(1, 0.55), car(3, 0.0)],
            Duration::from_secs(5),
        );

        let pairs: Vec<_> = field
            .paired()
            .map(|(c, p)| (c.driver_id, p.driver_id))
            .collect();
        assert_eq!(pairs, vec![(DriverId(2), DriverId(2)), (DriverId(1), DriverId(1))]);
    }
}
