//! Simulation tunables.
//!
//! All balance numbers live in one immutable [`SimConfig`] that is handed to
//! the engine at construction. Tests build alternate configs with struct
//! update syntax instead of touching shared state. The numbers are starting
//! values for play-testing, not measured requirements.

use std::env;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`SimConfig::time_scale`].
pub const ENV_TIME_SCALE: &str = "PIPET_TIME_SCALE";

/// Environment variable overriding [`SimConfig::max_catchup_seconds`].
pub const ENV_MAX_CATCHUP: &str = "PIPET_MAX_CATCHUP_SECONDS";

/// Per-hour decay and recovery rates. All values are positive magnitudes;
/// the integrator applies the sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayRates {
    pub fullness: f32,
    /// Fullness loss while asleep.
    pub fullness_asleep: f32,
    pub happiness: f32,
    /// Extra happiness loss while hungry.
    pub happiness_hungry: f32,
    pub energy: f32,
    /// Energy gained while asleep.
    pub energy_regen: f32,
    pub discipline: f32,
    pub cleanliness: f32,
    /// Health loss while starving, exhausted or sick.
    pub health_neglect: f32,
    /// Extra health loss while dirty.
    pub health_dirty: f32,
    /// Health gained when no penalty applies.
    pub health_recovery: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            fullness: 8.0,
            fullness_asleep: 2.0,
            happiness: 10.0,
            happiness_hungry: 5.0,
            energy: 15.0,
            energy_regen: 30.0,
            discipline: 2.0,
            cleanliness: 6.0,
            health_neglect: 10.0,
            health_dirty: 2.5,
            health_recovery: 2.0,
        }
    }
}

/// Stat levels that switch conditional rates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareThresholds {
    /// Fullness below this makes the pet hungry.
    pub hungry: f32,
    /// Cleanliness below this makes the pet dirty.
    pub dirty: f32,
    /// Fullness or energy below this counts as neglect.
    pub critical: f32,
}

impl Default for CareThresholds {
    fn default() -> Self {
        Self {
            hungry: 20.0,
            dirty: 30.0,
            critical: 10.0,
        }
    }
}

/// Stat deltas applied by one user action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatDelta {
    pub fullness: f32,
    pub happiness: f32,
    pub energy: f32,
    pub health: f32,
    pub discipline: f32,
    pub cleanliness: f32,
}

/// Deltas and energy costs for every user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionEffects {
    pub feed: StatDelta,
    pub play: StatDelta,
    pub train: StatDelta,
    pub clean: StatDelta,
    pub medicine: StatDelta,
    /// Minimum energy needed to play.
    pub play_min_energy: f32,
    /// Minimum energy needed to train.
    pub train_min_energy: f32,
}

impl Default for ActionEffects {
    fn default() -> Self {
        Self {
            feed: StatDelta {
                fullness: 20.0,
                health: 5.0,
                ..StatDelta::default()
            },
            play: StatDelta {
                happiness: 30.0,
                energy: -10.0,
                ..StatDelta::default()
            },
            train: StatDelta {
                discipline: 15.0,
                happiness: -5.0,
                energy: -5.0,
                ..StatDelta::default()
            },
            clean: StatDelta {
                cleanliness: 30.0,
                happiness: 5.0,
                energy: -5.0,
                ..StatDelta::default()
            },
            medicine: StatDelta {
                health: 15.0,
                happiness: -5.0,
                ..StatDelta::default()
            },
            play_min_energy: 10.0,
            train_min_energy: 5.0,
        }
    }
}

/// Age thresholds (simulated hours) and care requirements for evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionRules {
    pub young_age_hours: f64,
    pub adult_age_hours: f64,
    pub elder_age_hours: f64,
    /// Minimum `average_care()` at evaluation time.
    pub min_care: f32,
    /// Discipline strictly above this picks the disciplined branch.
    pub branch_discipline: f32,
    /// The disciplined branch also needs fewer care mistakes than this.
    pub branch_max_care_mistakes: u32,
}

impl Default for EvolutionRules {
    fn default() -> Self {
        Self {
            young_age_hours: 24.0,
            adult_age_hours: 72.0,
            elder_age_hours: 168.0,
            min_care: 50.0,
            branch_discipline: 75.0,
            branch_max_care_mistakes: 3,
        }
    }
}

/// When the pet falls sick and gets better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SicknessRules {
    /// Health below this makes the pet sick. Starving does too.
    pub onset_health: f32,
    /// Health above this cures a sick pet.
    pub recover_health: f32,
    /// Extra happiness loss per hour while sick.
    pub happiness_penalty: f32,
}

impl Default for SicknessRules {
    fn default() -> Self {
        Self {
            onset_health: 10.0,
            recover_health: 50.0,
            happiness_penalty: 10.0,
        }
    }
}

/// Extra energy drain for a pet kept awake at night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightRules {
    /// Local hour night begins, inclusive.
    pub start_hour: f64,
    /// Local hour night ends, exclusive.
    pub end_hour: f64,
    /// Multiplier on awake energy drain during the night.
    pub energy_multiplier: f32,
}

impl Default for NightRules {
    fn default() -> Self {
        Self {
            start_hour: 22.0,
            end_hour: 6.0,
            energy_multiplier: 1.5,
        }
    }
}

impl NightRules {
    /// Whether `hour` (0..24) falls inside the night window.
    pub fn is_night(&self, hour: f64) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Complete simulation configuration.
///
/// Deserializes from a partial document: anything left out keeps its
/// default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Multiplier on real elapsed time (1.0 = real time).
    pub time_scale: f64,
    /// Real seconds beyond this are dropped from a single `advance`.
    pub max_catchup_seconds: f64,
    pub decay: DecayRates,
    pub thresholds: CareThresholds,
    pub actions: ActionEffects,
    pub evolution: EvolutionRules,
    pub sickness: SicknessRules,
    pub night: NightRules,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_catchup_seconds: 48.0 * 3600.0,
            decay: DecayRates::default(),
            thresholds: CareThresholds::default(),
            actions: ActionEffects::default(),
            evolution: EvolutionRules::default(),
            sickness: SicknessRules::default(),
            night: NightRules::default(),
        }
    }
}

impl SimConfig {
    /// Defaults with `time_scale` and `max_catchup_seconds` taken from the
    /// environment when set to a positive number.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace `time_scale` and `max_catchup_seconds` with the environment
    /// values that are set and valid.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(scale) = read_positive(ENV_TIME_SCALE) {
            self.time_scale = scale;
        }
        if let Some(max) = read_positive(ENV_MAX_CATCHUP) {
            self.max_catchup_seconds = max;
        }
        self
    }

    /// Real hours that pass per simulated hour, or `None` when time is frozen.
    pub fn real_hours_per_sim_hour(&self) -> Option<f64> {
        (self.time_scale.is_finite() && self.time_scale > 0.0).then(|| 1.0 / self.time_scale)
    }

    /// Convert real elapsed seconds into simulated hours.
    ///
    /// Negative or NaN input counts as zero. The clamp to
    /// `max_catchup_seconds` happens before scaling.
    pub fn simulated_hours(&self, elapsed_seconds: f64) -> f64 {
        self.clamp_elapsed(elapsed_seconds) * self.time_scale / 3600.0
    }

    /// Real elapsed seconds after the catch-up clamp.
    pub fn clamp_elapsed(&self, elapsed_seconds: f64) -> f64 {
        if elapsed_seconds.is_nan() || elapsed_seconds <= 0.0 {
            return 0.0;
        }
        elapsed_seconds.min(self.max_catchup_seconds)
    }
}

fn read_positive(key: &str) -> Option<f64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        _ => {
            log::warn!("ignoring {key}={raw:?}: expected a positive number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_documented_values() {
        let config = SimConfig::default();
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.max_catchup_seconds, 172_800.0);
        assert_eq!(config.decay.cleanliness, 6.0);
        assert_eq!(config.decay.health_dirty, 2.5);
        assert_eq!(config.thresholds.dirty, 30.0);
        assert_eq!(config.evolution.branch_discipline, 75.0);
        assert_eq!(config.actions.clean.cleanliness, 30.0);
        assert_eq!(config.actions.medicine.health, 15.0);
    }

    #[test]
    fn test_simulated_hours_scales() {
        let config = SimConfig {
            time_scale: 10.0,
            ..SimConfig::default()
        };
        assert!((config.simulated_hours(360.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_before_scale() {
        let config = SimConfig {
            time_scale: 2.0,
            max_catchup_seconds: 3600.0,
            ..SimConfig::default()
        };
        // 5 real hours clamp to 1, then scale to 2 simulated hours
        assert!((config.simulated_hours(5.0 * 3600.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_night_window() {
        let night = NightRules::default();
        assert!(night.is_night(22.0));
        assert!(night.is_night(23.9));
        assert!(night.is_night(0.0));
        assert!(night.is_night(5.99));
        assert!(!night.is_night(6.0));
        assert!(!night.is_night(21.99));

        let same_day = NightRules {
            start_hour: 1.0,
            end_hour: 4.0,
            ..NightRules::default()
        };
        assert!(same_day.is_night(2.0));
        assert!(!same_day.is_night(4.0));
    }

    #[test]
    fn test_from_env_overrides() {
        // the only test in this crate touching these variables
        env::set_var(ENV_TIME_SCALE, "60");
        env::set_var(ENV_MAX_CATCHUP, " 3600 ");
        let config = SimConfig::from_env();
        assert_eq!(config.time_scale, 60.0);
        assert_eq!(config.max_catchup_seconds, 3600.0);

        for bad in ["-2", "0", "fast", "NaN", "inf"] {
            env::set_var(ENV_TIME_SCALE, bad);
            env::set_var(ENV_MAX_CATCHUP, bad);
            let config = SimConfig::from_env();
            assert_eq!(config.time_scale, 1.0, "{bad}");
            assert_eq!(config.max_catchup_seconds, 172_800.0, "{bad}");
        }

        env::remove_var(ENV_TIME_SCALE);
        env::remove_var(ENV_MAX_CATCHUP);
        assert_eq!(SimConfig::from_env(), SimConfig::default());
    }

    #[test]
    fn test_real_hours_per_sim_hour() {
        let fast = SimConfig {
            time_scale: 4.0,
            ..SimConfig::default()
        };
        assert_eq!(fast.real_hours_per_sim_hour(), Some(0.25));
        let frozen = SimConfig {
            time_scale: 0.0,
            ..SimConfig::default()
        };
        assert_eq!(frozen.real_hours_per_sim_hour(), None);
    }

    #[test]
    fn test_negative_and_nan_elapsed() {
        let config = SimConfig::default();
        assert_eq!(config.simulated_hours(-50.0), 0.0);
        assert_eq!(config.simulated_hours(f64::NAN), 0.0);
    }
}
