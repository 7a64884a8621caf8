//! Randomly generated hazards.

use crate::{DetectionResult, Detector, DetectorState, IncidentType};
use caution_telemetry::DriverField;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Throws a random caution with a target probability over a time window.
///
/// The probability `p` of at least one event across the whole window of
/// `L` seconds is converted into a constant per-tick Bernoulli rate of
/// `1 - (1 - p)^(1 / L)`.
#[derive(Debug, Clone)]
pub struct RandomDetector<R = StdRng> {
    chance: f64,
    start_minute: f64,
    end_minute: f64,
    max_occurrences: u32,
    rng: R,
}

impl RandomDetector<StdRng> {
    /// Create a detector seeded from the operating system.
    pub fn new(chance: f64, start_minute: f64, end_minute: f64, max_occurrences: u32) -> Self {
        Self::with_rng(
            chance,
            start_minute,
            end_minute,
            max_occurrences,
            StdRng::from_os_rng(),
        )
    }
}

impl<R: Rng> RandomDetector<R> {
    /// Create a detector drawing from the given generator.
    pub fn with_rng(
        chance: f64,
        start_minute: f64,
        end_minute: f64,
        max_occurrences: u32,
        rng: R,
    ) -> Self {
        Self {
            chance,
            start_minute,
            end_minute,
            max_occurrences,
            rng,
        }
    }

    /// Length of the active window in seconds.
    pub fn window_seconds(&self) -> f64 {
        (self.end_minute - self.start_minute) * 60.0
    }

    /// Probability of firing on a single tick.
    ///
    /// Zero when the window is empty.
    pub fn per_tick_probability(&self) -> f64 {
        per_tick_probability(self.chance, self.window_seconds())
    }
}

/// Per-tick Bernoulli rate for a cumulative probability `chance` spread over
/// `window_seconds` one-second ticks.
pub fn per_tick_probability(chance: f64, window_seconds: f64) -> f64 {
    if window_seconds <= 0.0 {
        return 0.0;
    }
    1.0 - (1.0 - chance).powf(window_seconds.recip())
}

impl<R: Rng + Send> Detector for RandomDetector<R> {
    fn should_run(&self, state: &DetectorState) -> bool {
        let elapsed = state.time_since_race_start.as_secs_f64();
        let start = self.start_minute * 60.0;
        let end = self.end_minute * 60.0;

        if !(start..=end).contains(&elapsed) {
            tracing::debug!(elapsed, start, end, "Random detector outside time window");
            return false;
        }

        let count = state.event_count(IncidentType::Random);
        if count >= self.max_occurrences {
            tracing::debug!(
                count,
                max = self.max_occurrences,
                "Random detector hit max occurrences"
            );
            return false;
        }

        true
    }

    fn detect(&mut self, _field: &DriverField) -> DetectionResult {
        if self.window_seconds() <= 0.0 {
            tracing::debug!("Random detector window is empty");
            return DetectionResult::flag(IncidentType::Random, false);
        }

        let roll: f64 = self.rng.random();
        let chance = self.per_tick_probability();
        let triggered = roll <= chance;

        if triggered {
            tracing::info!(roll, chance, base_chance = self.chance, "Random incident triggered");
        } else {
            tracing::debug!(roll, chance, "Random incident not triggered");
        }

        DetectionResult::flag(IncidentType::Random, triggered)
    }
}
