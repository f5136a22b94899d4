//! The pet's bounded stats.
//!
//! Every stat lives in `[STAT_MIN, STAT_MAX]`. Fields are private so the
//! only way to change a value is through [`PetStats::set`] or
//! [`PetStats::adjust`], both of which clamp.

use serde::{Deserialize, Serialize};

/// Lower bound for every stat.
pub const STAT_MIN: f32 = 0.0;

/// Upper bound for every stat.
pub const STAT_MAX: f32 = 100.0;

/// Identifies one of the six stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Fullness,
    Happiness,
    Energy,
    Health,
    Discipline,
    Cleanliness,
}

impl StatKind {
    /// All stats in display order.
    pub const ALL: [StatKind; 6] = [
        StatKind::Fullness,
        StatKind::Happiness,
        StatKind::Energy,
        StatKind::Health,
        StatKind::Discipline,
        StatKind::Cleanliness,
    ];

    /// Field name used in save files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fullness => "fullness",
            Self::Happiness => "happiness",
            Self::Energy => "energy",
            Self::Health => "health",
            Self::Discipline => "discipline",
            Self::Cleanliness => "cleanliness",
        }
    }

    /// Value a brand-new pet starts with.
    pub const fn default_value(self) -> f32 {
        match self {
            Self::Fullness => 50.0,
            Self::Happiness => 100.0,
            Self::Energy => 100.0,
            Self::Health => 100.0,
            Self::Discipline => 50.0,
            Self::Cleanliness => 100.0,
        }
    }
}

/// Clamp a raw value into the stat range. NaN maps to `STAT_MIN`.
pub fn clamp_stat(value: f32) -> f32 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

/// Whether `value` is a finite number inside the stat range.
pub fn is_valid_stat(value: f64) -> bool {
    value.is_finite() && (STAT_MIN as f64..=STAT_MAX as f64).contains(&value)
}

/// Numeric state of the pet. 100 = best for every stat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PetStats {
    fullness: f32,
    happiness: f32,
    energy: f32,
    health: f32,
    discipline: f32,
    cleanliness: f32,
}

impl Default for PetStats {
    fn default() -> Self {
        Self {
            fullness: StatKind::Fullness.default_value(),
            happiness: StatKind::Happiness.default_value(),
            energy: StatKind::Energy.default_value(),
            health: StatKind::Health.default_value(),
            discipline: StatKind::Discipline.default_value(),
            cleanliness: StatKind::Cleanliness.default_value(),
        }
    }
}

impl PetStats {
    pub fn fullness(&self) -> f32 {
        self.fullness
    }

    pub fn happiness(&self) -> f32 {
        self.happiness
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn discipline(&self) -> f32 {
        self.discipline
    }

    pub fn cleanliness(&self) -> f32 {
        self.cleanliness
    }

    /// Read a stat by kind.
    pub fn get(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::Fullness => self.fullness,
            StatKind::Happiness => self.happiness,
            StatKind::Energy => self.energy,
            StatKind::Health => self.health,
            StatKind::Discipline => self.discipline,
            StatKind::Cleanliness => self.cleanliness,
        }
    }

    /// Set a stat, clamped into range.
    pub fn set(&mut self, kind: StatKind, value: f32) {
        *self.slot(kind) = clamp_stat(value);
    }

    /// Add `delta` to a stat, clamped into range. A NaN delta is ignored.
    pub fn adjust(&mut self, kind: StatKind, delta: f32) {
        if delta.is_nan() {
            return;
        }
        let slot = self.slot(kind);
        *slot = clamp_stat(*slot + delta);
    }

    /// Care score used by evolution checks: mean of health and happiness.
    pub fn average_care(&self) -> f32 {
        (self.health + self.happiness) / 2.0
    }

    fn slot(&mut self, kind: StatKind) -> &mut f32 {
        match kind {
            StatKind::Fullness => &mut self.fullness,
            StatKind::Happiness => &mut self.happiness,
            StatKind::Energy => &mut self.energy,
            StatKind::Health => &mut self.health,
            StatKind::Discipline => &mut self.discipline,
            StatKind::Cleanliness => &mut self.cleanliness,
        }
    }
}
