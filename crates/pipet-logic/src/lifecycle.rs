//! Derived-state evaluation: death, sickness, neglect, evolution.
//!
//! Runs after every decay step and every applied action.

use crate::config::SimConfig;
use crate::decay::{sickness_after, DecayOutcome};
use crate::stage::{next_stage, LifeStage};
use crate::state::PetState;
use crate::stats::{PetStats, STAT_MIN};

/// Something noteworthy that happened during an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PetEvent {
    Evolved { from: LifeStage, to: LifeStage },
    /// The pet entered a neglected state; `total` is the new count.
    CareMistake { total: u32 },
    /// The pet fell sick. Counts as a care mistake; `total` is the new count.
    FellSick { total: u32 },
    Recovered,
    Died,
}

/// Whether health has run out.
pub fn is_dead(stats: &PetStats) -> bool {
    stats.health() <= STAT_MIN
}

/// Fullness or energy below the critical threshold.
pub fn is_neglected(stats: &PetStats, config: &SimConfig) -> bool {
    let critical = config.thresholds.critical;
    stats.fullness() < critical || stats.energy() < critical
}

fn set_sick(state: &mut PetState, sick: bool) -> PetEvent {
    state.sick = sick;
    if sick {
        state.care_mistakes = state.care_mistakes.saturating_add(1);
        PetEvent::FellSick {
            total: state.care_mistakes,
        }
    } else {
        PetEvent::Recovered
    }
}

/// Record the sickness changes [`integrate`](crate::decay::integrate)
/// reported, in the order they happened.
///
/// Onsets and recoveries alternate, so `state.sick` going in decides which
/// came first.
pub fn record_sickness(state: &mut PetState, outcome: &DecayOutcome) -> Vec<PetEvent> {
    let mut events = Vec::new();
    let (mut onsets, mut recoveries) = (outcome.fell_sick, outcome.recovered);
    loop {
        if state.sick && recoveries > 0 {
            recoveries -= 1;
            events.push(set_sick(state, false));
        } else if !state.sick && onsets > 0 {
            onsets -= 1;
            events.push(set_sick(state, true));
        } else {
            break;
        }
    }
    events
}

/// Update `state` from the current stats and return what changed.
///
/// A dead pet is left untouched. Death is checked first and ends the
/// evaluation. Evolution may advance several stages at once when a long
/// catch-up crossed more than one age threshold.
pub fn evaluate(stats: &PetStats, state: &mut PetState, config: &SimConfig) -> Vec<PetEvent> {
    let mut events = Vec::new();
    if !state.is_alive {
        return events;
    }

    if is_dead(stats) {
        state.is_alive = false;
        state.is_sleeping = false;
        state.sick = false;
        events.push(PetEvent::Died);
        return events;
    }

    if sickness_after(stats, state.sick, 0.0, &config.sickness) != state.sick {
        events.push(set_sick(state, !state.sick));
    }

    let neglected = is_neglected(stats, config);
    if neglected && !state.neglected {
        state.care_mistakes = state.care_mistakes.saturating_add(1);
        events.push(PetEvent::CareMistake {
            total: state.care_mistakes,
        });
    }
    state.neglected = neglected;

    while let Some(to) = next_stage(
        state.stage,
        stats,
        state.age_hours(),
        state.care_mistakes,
        &config.evolution,
    ) {
        debug_assert!(state.stage.can_transition_to(to));
        events.push(PetEvent::Evolved {
            from: state.stage,
            to,
        });
        state.stage = to;
    }

    events
}
