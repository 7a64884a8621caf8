//! Per-car telemetry snapshot contracts for the caution engine.
//!
//! The telemetry source hands the engine one [`DriverSnapshot`] per car on
//! every polling tick. [`DriverField`] keeps the current tick together with
//! the previous one so motion-based detectors can compare positions.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod field;

pub use field::DriverField;

use bitflags::bitflags;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Stable car index as reported by the simulator (`CarIdx`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub i32);

impl DriverId {
    /// Identity used for observations that are not tied to a car, such as a
    /// random incident. Never collides with a real car index.
    pub const SENTINEL: DriverId = DriverId(-1);

    /// Returns true for the synthetic identity.
    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "<none>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Where a car currently is, as reported by `CarIdxTrackSurface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackLocation {
    /// Car is not in the world (garage, disconnected, spectating).
    NotInWorld,
    /// Car has left the racing surface.
    OffTrack,
    /// Car is sitting in its pit stall.
    InPitStall,
    /// Car is on the pit entry / approach lane.
    ApproachingPits,
    /// Car is on the racing surface.
    #[default]
    OnTrack,
}

impl TrackLocation {
    /// Map the irsdk `TrkLoc` integer code.
    ///
    /// Returns `None` for codes the simulator does not define.
    pub fn from_irsdk(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::NotInWorld),
            0 => Some(Self::OffTrack),
            1 => Some(Self::InPitStall),
            2 => Some(Self::ApproachingPits),
            3 => Some(Self::OnTrack),
            _ => None,
        }
    }

    /// True when the car is not driving around the lap: pit approach, pit
    /// stall, or out of the world.
    pub fn is_pit_or_absent(self) -> bool {
        matches!(
            self,
            Self::ApproachingPits | Self::InPitStall | Self::NotInWorld
        )
    }
}

bitflags! {
    /// Per-car session flags (`CarIdxSessionFlags`).
    ///
    /// Only the car-specific bits used by incident detection are named;
    /// unknown bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SessionFlags: u32 {
        /// Disqualification signal.
        const BLACK = 0x0001_0000;
        /// Driver removed from the race.
        const DISQUALIFY = 0x0002_0000;
        /// Car is permitted pit service.
        const SERVICIBLE = 0x0004_0000;
        /// Meatball flag: mechanical problem.
        const FURLED = 0x0008_0000;
        /// Structural damage requiring repair.
        const REPAIR = 0x0010_0000;

        /// Bits that indicate the car is damaged.
        const DAMAGE = Self::FURLED.bits() | Self::REPAIR.bits();

        const _ = !0;
    }
}

impl SessionFlags {
    /// Human readable names of the attention-worthy bits that are set.
    pub fn attention_labels(self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.contains(Self::FURLED) {
            labels.push("FURLED/MEATBALL");
        }
        if self.contains(Self::REPAIR) {
            labels.push("REPAIR");
        }
        if self.contains(Self::BLACK) {
            labels.push("BLACK");
        }
        if self.contains(Self::DISQUALIFY) {
            labels.push("DISQUALIFY");
        }
        labels
    }
}

/// Immutable per-tick record for a single car.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverSnapshot {
    /// Stable car index.
    pub driver_id: DriverId,
    /// Track surface classification.
    pub track_location: TrackLocation,
    /// Fraction of the lap covered (0.0 to 1.0, may exceed 1.0 or be
    /// negative when the car is not in the world).
    pub lap_distance: f64,
    /// Completed laps; negative until the car takes the start.
    pub laps_completed: i32,
    /// Whether the car is between the pit road markers.
    pub on_pit_road: bool,
    /// Whether this entry is the pace car.
    pub is_pace_car: bool,
    /// Car-specific session flags.
    pub session_flags: SessionFlags,
}

impl DriverSnapshot {
    /// Create an on-track snapshot at the start/finish line with zero laps.
    pub fn new(driver_id: DriverId) -> Self {
        Self {
            driver_id,
            track_location: TrackLocation::OnTrack,
            lap_distance: 0.0,
            laps_completed: 0,
            on_pit_road: false,
            is_pace_car: false,
            session_flags: SessionFlags::empty(),
        }
    }

    /// Set the track location.
    pub fn with_track_location(mut self, location: TrackLocation) -> Self {
        self.track_location = location;
        self
    }

    /// Set the lap distance fraction.
    pub fn with_lap_distance(mut self, lap_distance: f64) -> Self {
        self.lap_distance = lap_distance;
        self
    }

    /// Set the completed lap count.
    pub fn with_laps_completed(mut self, laps: i32) -> Self {
        self.laps_completed = laps;
        self
    }

    /// Set the pit road flag.
    pub fn with_on_pit_road(mut self, on_pit_road: bool) -> Self {
        self.on_pit_road = on_pit_road;
        self
    }

    /// Mark this entry as the pace car.
    pub fn with_pace_car(mut self, is_pace_car: bool) -> Self {
        self.is_pace_car = is_pace_car;
        self
    }

    /// Set the session flags.
    pub fn with_session_flags(mut self, flags: SessionFlags) -> Self {
        self.session_flags = flags;
        self
    }

    /// A car is racing once it has started its first lap.
    pub fn is_active(&self) -> bool {
        self.laps_completed >= 0
    }

    /// Active, non pace-car entry.
    pub fn is_competitor(&self) -> bool {
        self.is_active() && !self.is_pace_car
    }

    /// Total race distance covered in laps (`laps_completed + lap_distance`).
    pub fn race_position(&self) -> f64 {
        f64::from(self.laps_completed) + self.lap_distance
    }

    /// Lap distance folded into `[0.0, 1.0)`.
    pub fn normalized_lap_distance(&self) -> f64 {
        self.lap_distance.rem_euclid(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn track_location_maps_irsdk_codes() {
        assert_eq!(TrackLocation::from_irsdk(-1), Some(TrackLocation::NotInWorld));
        assert_eq!(TrackLocation::from_irsdk(0), Some(TrackLocation::OffTrack));
        assert_eq!(TrackLocation::from_irsdk(1), Some(TrackLocation::InPitStall));
        assert_eq!(TrackLocation::from_irsdk(2), Some(TrackLocation::ApproachingPits));
        assert_eq!(TrackLocation::from_irsdk(3), Some(TrackLocation::OnTrack));
        assert_eq!(TrackLocation::from_irsdk(4), None);
        assert_eq!(TrackLocation::from_irsdk(-2), None);
    }

    #[test]
    fn pit_related_locations() {
        assert!(TrackLocation::ApproachingPits.is_pit_or_absent());
        assert!(TrackLocation::InPitStall.is_pit_or_absent());
        assert!(TrackLocation::NotInWorld.is_pit_or_absent());
        assert!(!TrackLocation::OnTrack.is_pit_or_absent());
        assert!(!TrackLocation::OffTrack.is_pit_or_absent());
    }

    #[test]
    fn damage_mask_is_furled_or_repair() {
        assert!(SessionFlags::FURLED.intersects(SessionFlags::DAMAGE));
        assert!(SessionFlags::REPAIR.intersects(SessionFlags::DAMAGE));
        assert!(!SessionFlags::BLACK.intersects(SessionFlags::DAMAGE));
        assert!(!SessionFlags::SERVICIBLE.intersects(SessionFlags::DAMAGE));
        assert!(!SessionFlags::empty().intersects(SessionFlags::DAMAGE));
        assert_eq!(SessionFlags::DAMAGE.bits(), 0x0018_0000);
    }

    #[test]
    fn unknown_flag_bits_are_retained() {
        let flags = SessionFlags::from_bits_retain(0x0000_0004 | 0x0008_0000);
        assert!(flags.intersects(SessionFlags::DAMAGE));
        assert_eq!(flags.bits(), 0x0008_0004);
    }

    #[test]
    fn attention_labels_list_set_bits() {
        let flags = SessionFlags::FURLED | SessionFlags::BLACK;
        assert_eq!(flags.attention_labels(), vec!["FURLED/MEATBALL", "BLACK"]);
    }

    #[test]
    fn race_position_adds_laps_and_fraction() {
        let s = DriverSnapshot::new(DriverId(3))
            .with_laps_completed(4)
            .with_lap_distance(0.25);
        assert_relative_eq!(s.race_position(), 4.25);
    }

    #[test]
    fn normalized_lap_distance_wraps() {
        let s = DriverSnapshot::new(DriverId(1)).with_lap_distance(1.2);
        assert_relative_eq!(s.normalized_lap_distance(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn competitor_excludes_pace_car_and_inactive() {
        let base = DriverSnapshot::new(DriverId(0));
        assert!(base.is_competitor());
        assert!(!base.with_pace_car(true).is_competitor());
        assert!(!base.with_laps_completed(-1).is_competitor());
    }

    #[test]
    fn sentinel_driver_displays_placeholder() {
        assert_eq!(DriverId::SENTINEL.to_string(), "<none>");
        assert_eq!(DriverId(12).to_string(), "12");
    }

    #[test]
    fn snapshot_serializes_with_snake_case_location() -> Result<(), serde_json::Error> {
        let s = DriverSnapshot::new(DriverId(7)).with_track_location(TrackLocation::OffTrack);
        let json = serde_json::to_string(&s)?;
        assert!(json.contains("\"off_track\""));
        let back: DriverSnapshot = serde_json::from_str(&json)?;
        assert_eq!(back, s);
        Ok(())
    }
}
