//! Life stages and the one-way evolution table.
//!
//! A pet starts as a [`LifeStage::Baby`] and moves along
//! `Baby → Young → Adult → Elder`. The branch (disciplined or free-spirited)
//! is picked once when the baby grows up and is carried unchanged through
//! every later stage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EvolutionRules;
use crate::stats::PetStats;

/// Personality line chosen at the first evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Disciplined,
    FreeSpirited,
}

impl Branch {
    /// Disciplined needs discipline strictly above `branch_discipline` and
    /// fewer than `branch_max_care_mistakes` care mistakes.
    pub fn choose(discipline: f32, care_mistakes: u32, rules: &EvolutionRules) -> Self {
        if discipline > rules.branch_discipline && care_mistakes < rules.branch_max_care_mistakes {
            Self::Disciplined
        } else {
            Self::FreeSpirited
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disciplined => "disciplined",
            Self::FreeSpirited => "free_spirited",
        }
    }
}

/// Stage without the branch, ordered by development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Baby,
    Young,
    Adult,
    Elder,
}

impl StageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baby => "baby",
            Self::Young => "young",
            Self::Adult => "adult",
            Self::Elder => "elder",
        }
    }

    /// Simulated age in hours needed to enter this stage.
    pub fn age_threshold_hours(self, rules: &EvolutionRules) -> f64 {
        match self {
            Self::Baby => 0.0,
            Self::Young => rules.young_age_hours,
            Self::Adult => rules.adult_age_hours,
            Self::Elder => rules.elder_age_hours,
        }
    }
}

/// Allowed evolution edges. Anything not listed here is illegal.
pub const TRANSITIONS: [(StageKind, StageKind); 3] = [
    (StageKind::Baby, StageKind::Young),
    (StageKind::Young, StageKind::Adult),
    (StageKind::Adult, StageKind::Elder),
];

/// Successor of `kind` in [`TRANSITIONS`], if any.
pub fn successor(kind: StageKind) -> Option<StageKind> {
    TRANSITIONS
        .iter()
        .find(|(from, _)| *from == kind)
        .map(|(_, to)| *to)
}

/// Developmental stage of the pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifeStage {
    #[default]
    Baby,
    Young(Branch),
    Adult(Branch),
    Elder(Branch),
}

impl LifeStage {
    /// Every stage, in save-file tag order.
    pub const ALL: [LifeStage; 7] = [
        LifeStage::Baby,
        LifeStage::Young(Branch::Disciplined),
        LifeStage::Young(Branch::FreeSpirited),
        LifeStage::Adult(Branch::Disciplined),
        LifeStage::Adult(Branch::FreeSpirited),
        LifeStage::Elder(Branch::Disciplined),
        LifeStage::Elder(Branch::FreeSpirited),
    ];

    /// Build a stage from its parts. `Baby` has no branch, so `branch` is
    /// ignored for it.
    pub fn from_parts(kind: StageKind, branch: Branch) -> Self {
        match kind {
            StageKind::Baby => Self::Baby,
            StageKind::Young => Self::Young(branch),
            StageKind::Adult => Self::Adult(branch),
            StageKind::Elder => Self::Elder(branch),
        }
    }

    pub fn kind(self) -> StageKind {
        match self {
            Self::Baby => StageKind::Baby,
            Self::Young(_) => StageKind::Young,
            Self::Adult(_) => StageKind::Adult,
            Self::Elder(_) => StageKind::Elder,
        }
    }

    pub fn branch(self) -> Option<Branch> {
        match self {
            Self::Baby => None,
            Self::Young(b) | Self::Adult(b) | Self::Elder(b) => Some(b),
        }
    }

    /// Save-file tag, e.g. `young_free_spirited`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baby => "baby",
            Self::Young(Branch::Disciplined) => "young_disciplined",
            Self::Young(Branch::FreeSpirited) => "young_free_spirited",
            Self::Adult(Branch::Disciplined) => "adult_disciplined",
            Self::Adult(Branch::FreeSpirited) => "adult_free_spirited",
            Self::Elder(Branch::Disciplined) => "elder_disciplined",
            Self::Elder(Branch::FreeSpirited) => "elder_free_spirited",
        }
    }

    /// Whether moving from `self` to `to` follows the table and keeps the
    /// branch.
    pub fn can_transition_to(self, to: LifeStage) -> bool {
        if successor(self.kind()) != Some(to.kind()) {
            return false;
        }
        match (self.branch(), to.branch()) {
            (Some(from), Some(next)) => from == next,
            (None, Some(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for LifeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifeStage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or(())
    }
}

/// The stage the pet should evolve into right now, if any.
///
/// Requires both the age threshold of the next stage and
/// `average_care() >= min_care`. The branch is chosen here only when leaving
/// `Baby`; otherwise the current branch is kept.
pub fn next_stage(
    stage: LifeStage,
    stats: &PetStats,
    age_hours: f64,
    care_mistakes: u32,
    rules: &EvolutionRules,
) -> Option<LifeStage> {
    let to = successor(stage.kind())?;
    if age_hours < to.age_threshold_hours(rules) {
        return None;
    }
    if stats.average_care() < rules.min_care {
        return None;
    }
    let branch = stage
        .branch()
        .unwrap_or_else(|| Branch::choose(stats.discipline(), care_mistakes, rules));
    Some(LifeStage::from_parts(to, branch))
}
