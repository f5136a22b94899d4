//! Simulation engine - the stateful pet that ticks and reacts to actions

use pipet_logic::actions::{apply_action, Action, Rejection};
use pipet_logic::config::SimConfig;
use pipet_logic::decay::{integrate, DecayContext};
use pipet_logic::lifecycle::{evaluate, record_sickness, PetEvent};
use pipet_logic::stage::LifeStage;
use pipet_logic::state::PetState;
use pipet_logic::stats::PetStats;

/// What one call to [`PetEngine::advance`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Real seconds fed to the simulation after the catch-up clamp.
    pub applied_seconds: f64,
    /// Real seconds dropped by the clamp. Never replayed.
    pub discarded_seconds: f64,
    /// Simulated seconds the pet actually lived through.
    pub simulated_seconds: f64,
    pub events: Vec<PetEvent>,
}

impl TickReport {
    fn idle(discarded_seconds: f64) -> Self {
        Self {
            applied_seconds: 0.0,
            discarded_seconds,
            simulated_seconds: 0.0,
            events: Vec::new(),
        }
    }
}

/// Result of a user action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action took effect; `events` come from the re-evaluation right after.
    Applied { events: Vec<PetEvent> },
    /// Nothing changed.
    Rejected(Rejection),
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn events(&self) -> &[PetEvent] {
        match self {
            Self::Applied { events } => events,
            Self::Rejected(_) => &[],
        }
    }
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PetSnapshot {
    pub stats: PetStats,
    pub stage: LifeStage,
    pub is_alive: bool,
    pub is_sleeping: bool,
    pub is_sick: bool,
    pub age_hours: f64,
    pub care_mistakes: u32,
    pub average_care: f32,
}

/// Main simulation engine
pub struct PetEngine {
    config: SimConfig,
    stats: PetStats,
    state: PetState,
}

impl PetEngine {
    /// A newborn pet with default stats.
    pub fn new(config: SimConfig, birth_time: f64) -> Self {
        Self {
            config,
            stats: PetStats::default(),
            state: PetState::newborn(birth_time),
        }
    }

    /// Resume from previously saved parts.
    pub fn from_parts(config: SimConfig, stats: PetStats, state: PetState) -> Self {
        Self {
            config,
            stats,
            state,
        }
    }

    /// Advance the simulation by `elapsed_seconds` of real time, with the
    /// night rules off.
    pub fn advance(&mut self, elapsed_seconds: f64) -> TickReport {
        self.advance_at(elapsed_seconds, None)
    }

    /// Advance the simulation by `elapsed_seconds` of real time.
    ///
    /// Elapsed time is clamped to `max_catchup_seconds`, then multiplied by
    /// `time_scale`. `hour_of_day` is the local hour at the start of the
    /// applied interval. Death, sickness, neglect and evolution are evaluated
    /// afterwards.
    pub fn advance_at(&mut self, elapsed_seconds: f64, hour_of_day: Option<f64>) -> TickReport {
        let applied = self.config.clamp_elapsed(elapsed_seconds);
        let discarded = if elapsed_seconds.is_finite() {
            (elapsed_seconds - applied).max(0.0)
        } else {
            0.0
        };

        if !self.state.is_alive {
            return TickReport::idle(discarded);
        }
        if discarded > 0.0 {
            log::debug!(
                "catch-up clamped: {:.0}s applied, {:.0}s dropped",
                applied,
                discarded
            );
        }

        let hours = self.config.simulated_hours(elapsed_seconds);
        let mut ctx = DecayContext {
            asleep: self.state.is_sleeping,
            sick: self.state.sick,
            hour_of_day,
        };
        let outcome = integrate(&mut self.stats, &mut ctx, hours, &self.config);
        let simulated_seconds = outcome.hours_applied * 3600.0;
        self.state.age_seconds += simulated_seconds;

        let mut events = record_sickness(&mut self.state, &outcome);
        self.log_events(&events);
        events.extend(self.reevaluate());

        TickReport {
            applied_seconds: applied,
            discarded_seconds: discarded,
            simulated_seconds,
            events,
        }
    }

    /// Apply a user action, then re-evaluate derived state.
    pub fn apply(&mut self, action: Action) -> ActionOutcome {
        match apply_action(
            action,
            &mut self.stats,
            &mut self.state,
            &self.config.actions,
        ) {
            Ok(()) => ActionOutcome::Applied {
                events: self.reevaluate(),
            },
            Err(rejection) => {
                log::debug!("{action} rejected: {rejection}");
                ActionOutcome::Rejected(rejection)
            }
        }
    }

    pub fn feed(&mut self) -> ActionOutcome {
        self.apply(Action::Feed)
    }

    pub fn play(&mut self) -> ActionOutcome {
        self.apply(Action::Play)
    }

    pub fn train(&mut self) -> ActionOutcome {
        self.apply(Action::Train)
    }

    pub fn clean(&mut self) -> ActionOutcome {
        self.apply(Action::Clean)
    }

    pub fn give_medicine(&mut self) -> ActionOutcome {
        self.apply(Action::Medicine)
    }

    pub fn sleep(&mut self) -> ActionOutcome {
        self.apply(Action::Sleep)
    }

    pub fn wake(&mut self) -> ActionOutcome {
        self.apply(Action::Wake)
    }

    fn reevaluate(&mut self) -> Vec<PetEvent> {
        let events = evaluate(&self.stats, &mut self.state, &self.config);
        self.log_events(&events);
        events
    }

    fn log_events(&self, events: &[PetEvent]) {
        for event in events {
            match event {
                PetEvent::Evolved { from, to } => {
                    log::info!(
                        "pet evolved {from} -> {to} at {:.1}h",
                        self.state.age_hours()
                    );
                }
                PetEvent::CareMistake { total } => log::debug!("care mistake #{total}"),
                PetEvent::FellSick { total } => log::info!(
                    "pet fell sick at {:.1}h (care mistake #{total})",
                    self.state.age_hours()
                ),
                PetEvent::Recovered => log::info!("pet recovered"),
                PetEvent::Died => log::info!(
                    "pet died at {:.1}h as {}",
                    self.state.age_hours(),
                    self.state.stage
                ),
            }
        }
    }

    pub fn stats(&self) -> &PetStats {
        &self.stats
    }

    pub fn state(&self) -> &PetState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stage(&self) -> LifeStage {
        self.state.stage
    }

    pub fn is_alive(&self) -> bool {
        self.state.is_alive
    }

    pub fn snapshot(&self) -> PetSnapshot {
        PetSnapshot {
            stats: self.stats,
            stage: self.state.stage,
            is_alive: self.state.is_alive,
            is_sleeping: self.state.is_sleeping,
            is_sick: self.state.sick,
            age_hours: self.state.age_hours(),
            care_mistakes: self.state.care_mistakes,
            average_care: self.stats.average_care(),
        }
    }
}
