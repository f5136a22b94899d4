//! User actions and their stat effects.
//!
//! [`apply_action`] checks preconditions and applies the configured
//! [`StatDelta`]. It does not evaluate death or evolution; the engine does
//! that right after a successful action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ActionEffects, StatDelta};
use crate::state::PetState;
use crate::stats::{PetStats, StatKind, STAT_MAX};

/// A discrete user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Feed,
    Play,
    Train,
    Clean,
    Medicine,
    Sleep,
    Wake,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Feed,
        Action::Play,
        Action::Train,
        Action::Clean,
        Action::Medicine,
        Action::Sleep,
        Action::Wake,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Train => "train",
            Self::Clean => "clean",
            Self::Medicine => "medicine",
            Self::Sleep => "sleep",
            Self::Wake => "wake",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or(())
    }
}

/// Why an action could not be applied. Rejections are ordinary outcomes for
/// the UI to report, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Dead,
    /// The pet is asleep and the action needs it awake.
    Asleep,
    AlreadyAsleep,
    AlreadyAwake,
    TooTired,
    Full,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Dead => "the pet has passed away",
            Self::Asleep => "the pet is asleep",
            Self::AlreadyAsleep => "the pet is already asleep",
            Self::AlreadyAwake => "the pet is already awake",
            Self::TooTired => "the pet is too tired",
            Self::Full => "the pet is not hungry",
        };
        f.write_str(msg)
    }
}

/// Check preconditions for `action` and apply its effect.
///
/// On rejection nothing is modified.
pub fn apply_action(
    action: Action,
    stats: &mut PetStats,
    state: &mut PetState,
    effects: &ActionEffects,
) -> Result<(), Rejection> {
    if !state.is_alive {
        return Err(Rejection::Dead);
    }

    match action {
        Action::Feed => {
            require_awake(state)?;
            if stats.fullness() >= STAT_MAX {
                return Err(Rejection::Full);
            }
            apply_delta(stats, &effects.feed);
        }
        Action::Play => {
            require_awake(state)?;
            if stats.energy() < effects.play_min_energy {
                return Err(Rejection::TooTired);
            }
            apply_delta(stats, &effects.play);
        }
        Action::Train => {
            require_awake(state)?;
            if stats.energy() < effects.train_min_energy {
                return Err(Rejection::TooTired);
            }
            apply_delta(stats, &effects.train);
        }
        Action::Clean => apply_delta(stats, &effects.clean),
        Action::Medicine => apply_delta(stats, &effects.medicine),
        Action::Sleep => {
            if state.is_sleeping {
                return Err(Rejection::AlreadyAsleep);
            }
            state.is_sleeping = true;
        }
        Action::Wake => {
            if !state.is_sleeping {
                return Err(Rejection::AlreadyAwake);
            }
            state.is_sleeping = false;
        }
    }

    Ok(())
}

fn require_awake(state: &PetState) -> Result<(), Rejection> {
    if state.is_sleeping {
        Err(Rejection::Asleep)
    } else {
        Ok(())
    }
}

/// Add every component of `delta`, clamped.
pub fn apply_delta(stats: &mut PetStats, delta: &StatDelta) {
    stats.adjust(StatKind::Fullness, delta.fullness);
    stats.adjust(StatKind::Happiness, delta.happiness);
    stats.adjust(StatKind::Energy, delta.energy);
    stats.adjust(StatKind::Health, delta.health);
    stats.adjust(StatKind::Discipline, delta.discipline);
    stats.adjust(StatKind::Cleanliness, delta.cleanliness);
}
