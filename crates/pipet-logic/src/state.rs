//! Non-numeric pet state: life stage, liveness, sleep, sickness, age, care record.

use crate::stage::LifeStage;

/// Everything about the pet that is not a bounded stat.
#[derive(Debug, Clone, PartialEq)]
pub struct PetState {
    pub stage: LifeStage,
    /// Once false, never true again for this record.
    pub is_alive: bool,
    pub is_sleeping: bool,
    /// Sick pets lose health and happiness until health recovers.
    pub sick: bool,
    /// Unix epoch seconds.
    pub birth_time: f64,
    /// Simulated seconds lived, after time scaling and catch-up clamping.
    pub age_seconds: f64,
    pub care_mistakes: u32,
    /// Whether the pet was neglected at the last evaluation.
    pub neglected: bool,
}

impl PetState {
    /// State of a pet born at `birth_time`.
    pub fn newborn(birth_time: f64) -> Self {
        Self {
            stage: LifeStage::Baby,
            is_alive: true,
            is_sleeping: false,
            sick: false,
            birth_time,
            age_seconds: 0.0,
            care_mistakes: 0,
            neglected: false,
        }
    }

    pub fn age_hours(&self) -> f64 {
        self.age_seconds / 3600.0
    }
}
