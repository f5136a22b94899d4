//! Stat decay over elapsed simulated time.
//!
//! Rates are constant as long as the pet's conditions (hungry, starving,
//! exhausted, dirty, sick, awake at night, health capped) don't change.
//! [`integrate`] walks the interval segment by segment, stopping at the exact
//! moment a stat or the time of day crosses one of those boundaries and
//! recomputing rates there. The result does not depend on how the interval
//! is split, so two calls of `a` and `b` hours end in the same place as one
//! call of `a + b` hours.
//!
//! Thresholds are strict ("below 30"). Conditions describe the segment that
//! starts at the current point, so a stat sitting exactly on a threshold
//! counts as below it when it is moving down. Without that, a stat snapped
//! onto its boundary would never be seen to cross it.

use crate::config::{DecayRates, NightRules, SicknessRules, SimConfig};
use crate::stats::{PetStats, StatKind, STAT_MAX, STAT_MIN};

/// Upper bound on boundary stops in one call.
const MAX_SEGMENTS: usize = 256;

/// Signed per-hour rate for every stat during one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatRates {
    pub fullness: f32,
    pub happiness: f32,
    pub energy: f32,
    pub health: f32,
    pub discipline: f32,
    pub cleanliness: f32,
}

impl StatRates {
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
}

/// Non-stat inputs to [`integrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayContext {
    pub asleep: bool,
    /// Updated in place when the pet falls sick or recovers.
    pub sick: bool,
    /// Real local hour of day (0..24), advanced in place. `None` turns the
    /// night rules off.
    pub hour_of_day: Option<f64>,
}

impl DecayContext {
    pub fn new(asleep: bool) -> Self {
        Self {
            asleep,
            sick: false,
            hour_of_day: None,
        }
    }
}

/// Conditions that switch conditional rate terms on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conditions {
    pub hungry: bool,
    pub starving: bool,
    pub exhausted: bool,
    pub dirty: bool,
    pub sick: bool,
    pub awake_at_night: bool,
}

/// Conditions over the segment starting now.
pub fn conditions(stats: &PetStats, ctx: &DecayContext, config: &SimConfig) -> Conditions {
    let decay = &config.decay;
    let thresholds = &config.thresholds;
    let awake_at_night = !ctx.asleep
        && ctx
            .hour_of_day
            .is_some_and(|hour| config.night.is_night(hour));

    Conditions {
        hungry: below(
            stats.fullness(),
            thresholds.hungry,
            fullness_rate(ctx.asleep, decay),
        ),
        starving: stats.fullness() <= STAT_MIN,
        // Empty energy only hurts while it is not refilling.
        exhausted: stats.energy() <= STAT_MIN
            && energy_rate(ctx.asleep, awake_at_night, decay, &config.night) <= 0.0,
        dirty: below(stats.cleanliness(), thresholds.dirty, -decay.cleanliness),
        sick: ctx.sick,
        awake_at_night,
    }
}

/// `value < threshold`, or sitting on it while falling.
fn below(value: f32, threshold: f32, rate: f32) -> bool {
    value < threshold || (value == threshold && rate < 0.0)
}

/// `value > threshold`, or sitting on it while rising.
fn above(value: f32, threshold: f32, rate: f32) -> bool {
    value > threshold || (value == threshold && rate > 0.0)
}

fn fullness_rate(asleep: bool, decay: &DecayRates) -> f32 {
    if asleep {
        -decay.fullness_asleep
    } else {
        -decay.fullness
    }
}

fn energy_rate(asleep: bool, awake_at_night: bool, decay: &DecayRates, night: &NightRules) -> f32 {
    if asleep {
        decay.energy_regen
    } else if awake_at_night {
        -decay.energy * night.energy_multiplier
    } else {
        -decay.energy
    }
}

/// Rates that apply right now.
pub fn current_rates(stats: &PetStats, ctx: &DecayContext, config: &SimConfig) -> StatRates {
    let decay = &config.decay;
    let cond = conditions(stats, ctx, config);

    let mut happiness = -decay.happiness;
    if cond.hungry {
        happiness -= decay.happiness_hungry;
    }
    if cond.sick {
        happiness -= config.sickness.happiness_penalty;
    }

    let mut health = 0.0;
    if cond.starving || cond.exhausted || cond.sick {
        health -= decay.health_neglect;
    }
    if cond.dirty {
        health -= decay.health_dirty;
    }
    if health == 0.0 && stats.health() < STAT_MAX {
        health = decay.health_recovery;
    }

    StatRates {
        fullness: fullness_rate(ctx.asleep, decay),
        happiness,
        energy: energy_rate(ctx.asleep, cond.awake_at_night, decay, &config.night),
        health,
        discipline: -decay.discipline,
        cleanliness: -decay.cleanliness,
    }
}

/// Whether the pet is sick after applying onset and recovery at this point.
///
/// Starving or health below `onset_health` makes a pet sick. It gets better
/// once health is above `recover_health` and it is no longer starving.
/// `health_rate` is the health trend over the coming segment; pass 0 when
/// checking a single point in time.
pub fn sickness_after(
    stats: &PetStats,
    sick: bool,
    health_rate: f32,
    rules: &SicknessRules,
) -> bool {
    let starving = stats.fullness() <= STAT_MIN;
    if sick {
        starving || !above(stats.health(), rules.recover_health, health_rate)
    } else {
        starving || below(stats.health(), rules.onset_health, health_rate)
    }
}

/// Result of one [`integrate`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecayOutcome {
    /// Simulated hours actually applied.
    pub hours_applied: f64,
    /// Health reached zero; integration stopped there.
    pub died: bool,
    /// Times the pet fell sick during the interval.
    pub fell_sick: u32,
    /// Times the pet got better during the interval.
    pub recovered: u32,
}

/// Apply `hours` of decay to `stats`.
///
/// Stops early if health reaches zero; the rest of the interval is dropped.
pub fn integrate(
    stats: &mut PetStats,
    ctx: &mut DecayContext,
    hours: f64,
    config: &SimConfig,
) -> DecayOutcome {
    let mut outcome = DecayOutcome::default();
    if stats.health() <= STAT_MIN {
        outcome.died = true;
        return outcome;
    }

    let real_per_sim = config.real_hours_per_sim_hour();
    let mut remaining = if hours.is_finite() { hours.max(0.0) } else { 0.0 };

    for segment in 0..=MAX_SEGMENTS {
        if remaining <= 0.0 {
            break;
        }

        let mut rates = current_rates(stats, ctx, config);
        let sick = sickness_after(stats, ctx.sick, rates.health, &config.sickness);
        if sick != ctx.sick {
            ctx.sick = sick;
            if sick {
                outcome.fell_sick += 1;
            } else {
                outcome.recovered += 1;
            }
            rates = current_rates(stats, ctx, config);
        }

        let crossing = if segment < MAX_SEGMENTS {
            next_crossing(stats, &rates, ctx, real_per_sim, config).filter(|c| c.hours < remaining)
        } else {
            None
        };
        let step = crossing.map_or(remaining, |c| c.hours);

        apply_rates(stats, &rates, step);
        advance_hour(ctx, step, real_per_sim);
        match crossing.map(|c| c.boundary) {
            Some(Boundary::Stat(kind, value)) => stats.set(kind, value),
            Some(Boundary::Hour(hour)) => ctx.hour_of_day = Some(hour),
            None => {}
        }
        remaining -= step;
        outcome.hours_applied += step;

        if stats.health() <= STAT_MIN {
            outcome.died = true;
            return outcome;
        }
    }

    outcome
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Stat(StatKind, f32),
    Hour(f64),
}

#[derive(Debug, Clone, Copy)]
struct Crossing {
    hours: f64,
    boundary: Boundary,
}

/// Values at which a stat's crossing changes some rate.
fn boundaries(kind: StatKind, config: &SimConfig) -> Vec<f32> {
    let thresholds = &config.thresholds;
    let sickness = &config.sickness;
    match kind {
        StatKind::Fullness => vec![thresholds.hungry, STAT_MIN],
        StatKind::Energy => vec![STAT_MIN, STAT_MAX],
        StatKind::Health => vec![
            STAT_MIN,
            sickness.onset_health,
            sickness.recover_health,
            STAT_MAX,
        ],
        StatKind::Cleanliness => vec![thresholds.dirty, STAT_MIN],
        StatKind::Happiness | StatKind::Discipline => Vec::new(),
    }
}

/// Earliest boundary any stat, or the time of day, reaches under `rates`.
fn next_crossing(
    stats: &PetStats,
    rates: &StatRates,
    ctx: &DecayContext,
    real_per_sim: Option<f64>,
    config: &SimConfig,
) -> Option<Crossing> {
    let mut best: Option<Crossing> = None;
    let mut consider = |hours: f64, boundary: Boundary| {
        if best.map_or(true, |b| hours < b.hours) {
            best = Some(Crossing { hours, boundary });
        }
    };

    for kind in StatKind::ALL {
        let value = stats.get(kind);
        let rate = rates.get(kind);
        if rate == 0.0 {
            continue;
        }
        for boundary in boundaries(kind, config) {
            let distance = if rate < 0.0 && boundary < value {
                value - boundary
            } else if rate > 0.0 && boundary > value {
                boundary - value
            } else {
                continue;
            };
            consider(
                distance as f64 / rate.abs() as f64,
                Boundary::Stat(kind, boundary),
            );
        }
    }

    // Day and night only change rates for an awake pet.
    if let (false, Some(hour), Some(real_per_sim)) = (ctx.asleep, ctx.hour_of_day, real_per_sim) {
        for edge in [config.night.start_hour, config.night.end_hour] {
            let edge = edge.rem_euclid(24.0);
            let mut real_hours = (edge - hour).rem_euclid(24.0);
            if real_hours <= 0.0 {
                real_hours = 24.0;
            }
            consider(real_hours / real_per_sim, Boundary::Hour(edge));
        }
    }

    best
}

fn apply_rates(stats: &mut PetStats, rates: &StatRates, hours: f64) {
    for kind in StatKind::ALL {
        let rate = rates.get(kind);
        if rate == 0.0 {
            continue;
        }
        let next = stats.get(kind) as f64 + rate as f64 * hours;
        stats.set(kind, next as f32);
    }
}

fn advance_hour(ctx: &mut DecayContext, sim_hours: f64, real_per_sim: Option<f64>) {
    if let (Some(hour), Some(real_per_sim)) = (ctx.hour_of_day, real_per_sim) {
        ctx.hour_of_day = Some((hour + sim_hours * real_per_sim).rem_euclid(24.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(stats: &mut PetStats, asleep: bool, hours: f64) -> DecayOutcome {
        integrate(
            stats,
            &mut DecayContext::new(asleep),
            hours,
            &SimConfig::default(),
        )
    }

    fn at_hour(hour: f64) -> DecayContext {
        DecayContext {
            hour_of_day: Some(hour),
            ..DecayContext::new(false)
        }
    }

    #[test]
    fn test_one_hour_from_defaults() {
        let mut stats = PetStats::default();
        let outcome = run(&mut stats, false, 1.0);
        assert!(!outcome.died);
        assert_eq!(stats.fullness(), 42.0);
        assert_eq!(stats.happiness(), 90.0);
        assert_eq!(stats.energy(), 85.0);
        assert_eq!(stats.discipline(), 48.0);
        assert_eq!(stats.cleanliness(), 94.0);
        assert_eq!(stats.health(), 100.0);
    }

    #[test]
    fn test_sleep_regenerates_energy_and_slows_hunger() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Energy, 40.0);
        run(&mut stats, true, 1.0);
        assert!((stats.energy() - 70.0).abs() < 0.001);
        assert!((stats.fullness() - 48.0).abs() < 0.001);
    }

    #[test]
    fn test_hunger_speeds_up_sadness_after_crossing() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Fullness, 24.0); // hungry after 0.5 h
        run(&mut stats, false, 1.0);
        // 0.5 h at 10/h + 0.5 h at 15/h
        assert!((stats.happiness() - 87.5).abs() < 0.001);
        assert!((stats.fullness() - 16.0).abs() < 0.001);
    }

    #[test]
    fn test_dirty_penalty_starts_at_crossing() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 80.0);
        stats.set(StatKind::Cleanliness, 33.0); // dirty after 0.5 h
        run(&mut stats, false, 1.0);
        // 0.5 h recovering at +2, then 0.5 h at -2.5
        assert!((stats.health() - 79.75).abs() < 0.001);
    }

    #[test]
    fn test_threshold_is_strict_for_a_still_stat() {
        let config = SimConfig {
            decay: DecayRates {
                cleanliness: 0.0,
                ..DecayRates::default()
            },
            ..SimConfig::default()
        };
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 80.0);
        stats.set(StatKind::Cleanliness, 30.0);
        let ctx = DecayContext::new(false);
        assert!(!conditions(&stats, &ctx, &config).dirty);

        integrate(&mut stats, &mut DecayContext::new(false), 1.0, &config);
        assert!((stats.health() - 82.0).abs() < 0.001);
    }

    #[test]
    fn test_threshold_counts_when_falling_through_it() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 80.0);
        stats.set(StatKind::Cleanliness, 30.0);
        stats.set(StatKind::Fullness, 20.0);
        let cond = conditions(&stats, &DecayContext::new(false), &SimConfig::default());
        assert!(cond.dirty);
        assert!(cond.hungry);

        run(&mut stats, false, 1.0);
        assert!((stats.health() - 77.5).abs() < 0.001);
        assert!((stats.happiness() - 85.0).abs() < 0.001);
    }

    #[test]
    fn test_starvation_kills_and_stops() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Fullness, 0.0);
        stats.set(StatKind::Health, 5.0);
        let outcome = run(&mut stats, false, 10.0);
        assert!(outcome.died);
        assert_eq!(stats.health(), 0.0);
        // 5 health at 10/h
        assert!((outcome.hours_applied - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_starving_makes_the_pet_sick() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Fullness, 2.0); // empty after 0.25 h
        stats.set(StatKind::Health, 60.0);
        let mut ctx = DecayContext::new(false);
        let outcome = integrate(&mut stats, &mut ctx, 1.0, &SimConfig::default());

        assert!(ctx.sick);
        assert_eq!(outcome.fell_sick, 1);
        // 0.25 h recovering at +2, then 0.75 h at -10
        assert!((stats.health() - 53.0).abs() < 0.001);
        // hungry throughout: 0.25 h at 15/h, then sick: 0.75 h at 25/h
        assert!((stats.happiness() - 77.5).abs() < 0.001);
    }

    #[test]
    fn test_low_health_makes_the_pet_sick() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 12.0);
        stats.set(StatKind::Cleanliness, 10.0); // dirty: -2.5/h
        let mut ctx = DecayContext::new(false);
        let outcome = integrate(&mut stats, &mut ctx, 1.0, &SimConfig::default());

        assert_eq!(outcome.fell_sick, 1);
        assert!(ctx.sick);
        // 0.8 h at -2.5 down to 10, then 0.2 h at -12.5
        assert!((stats.health() - 7.5).abs() < 0.001);
    }

    #[test]
    fn test_sick_pet_recovers_only_above_recovery_health() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 80.0);
        let mut ctx = DecayContext {
            sick: true,
            ..DecayContext::new(false)
        };
        // healthy enough to be cured at the first check
        let outcome = integrate(&mut stats, &mut ctx, 1.0, &SimConfig::default());
        assert_eq!(outcome.recovered, 1);
        assert!(!ctx.sick);
        assert_eq!(stats.health(), 82.0);

        stats.set(StatKind::Health, 30.0);
        let mut ctx = DecayContext {
            sick: true,
            ..DecayContext::new(false)
        };
        integrate(&mut stats, &mut ctx, 1.0, &SimConfig::default());
        assert!(ctx.sick);
        assert!((stats.health() - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_sickness_rules_at_a_point() {
        let rules = SicknessRules::default();
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 10.0);
        assert!(!sickness_after(&stats, false, 0.0, &rules));
        assert!(sickness_after(&stats, false, -1.0, &rules));
        stats.set(StatKind::Health, 9.0);
        assert!(sickness_after(&stats, false, 0.0, &rules));

        stats.set(StatKind::Health, 50.0);
        assert!(sickness_after(&stats, true, 0.0, &rules));
        stats.set(StatKind::Health, 51.0);
        assert!(!sickness_after(&stats, true, 0.0, &rules));
        // no cure while starving
        stats.set(StatKind::Fullness, 0.0);
        assert!(sickness_after(&stats, true, 0.0, &rules));
    }

    #[test]
    fn test_night_drains_more_energy() {
        let mut stats = PetStats::default();
        let mut ctx = at_hour(23.0);
        integrate(&mut stats, &mut ctx, 1.0, &SimConfig::default());
        assert!((stats.energy() - 77.5).abs() < 0.001);
        assert_eq!(ctx.hour_of_day, Some(0.0));
    }

    #[test]
    fn test_dawn_ends_the_night_drain() {
        let mut stats = PetStats::default();
        let mut ctx = at_hour(5.5);
        integrate(&mut stats, &mut ctx, 1.0, &SimConfig::default());
        // 0.5 h at 22.5/h, then 0.5 h at 15/h
        assert!((stats.energy() - 81.25).abs() < 0.001);
        assert!((ctx.hour_of_day.unwrap_or(0.0) - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_night_edges_follow_real_time() {
        let config = SimConfig {
            time_scale: 2.0,
            ..SimConfig::default()
        };
        let mut stats = PetStats::default();
        let mut ctx = at_hour(5.5);
        // one simulated hour is half a real hour: still night throughout
        integrate(&mut stats, &mut ctx, 1.0, &config);
        assert!((stats.energy() - 77.5).abs() < 0.001);
    }

    #[test]
    fn test_sleeping_at_night_is_unaffected() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Energy, 40.0);
        let mut ctx = DecayContext {
            hour_of_day: Some(1.0),
            ..DecayContext::new(true)
        };
        integrate(&mut stats, &mut ctx, 1.0, &SimConfig::default());
        assert!((stats.energy() - 70.0).abs() < 0.001);
    }

    #[test]
    fn test_exhaustion_does_not_hurt_while_sleeping() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Energy, 0.0);
        stats.set(StatKind::Health, 50.0);
        run(&mut stats, true, 1.0);
        assert!(stats.health() > 50.0);
    }

    #[test]
    fn test_recovery_caps_at_max() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 99.0);
        run(&mut stats, false, 2.0);
        assert_eq!(stats.health(), 100.0);
    }

    #[test]
    fn test_split_matches_single_call() {
        let mut start = PetStats::default();
        start.set(StatKind::Fullness, 30.0);
        start.set(StatKind::Cleanliness, 40.0);
        start.set(StatKind::Health, 90.0);
        let config = SimConfig::default();

        let mut once = start;
        let mut once_ctx = at_hour(20.0);
        integrate(&mut once, &mut once_ctx, 5.0, &config);

        let mut split = start;
        let mut split_ctx = at_hour(20.0);
        integrate(&mut split, &mut split_ctx, 1.3, &config);
        integrate(&mut split, &mut split_ctx, 3.7, &config);

        for kind in StatKind::ALL {
            assert!(
                (once.get(kind) - split.get(kind)).abs() < 0.001,
                "{kind:?}: {} vs {}",
                once.get(kind),
                split.get(kind)
            );
        }
        assert_eq!(once_ctx.sick, split_ctx.sick);
    }

    #[test]
    fn test_zero_and_negative_hours() {
        let mut stats = PetStats::default();
        let before = stats;
        run(&mut stats, false, 0.0);
        assert_eq!(stats, before);
        run(&mut stats, false, -4.0);
        assert_eq!(stats, before);
    }

    #[test]
    fn test_already_dead_health() {
        let mut stats = PetStats::default();
        stats.set(StatKind::Health, 0.0);
        let outcome = run(&mut stats, false, 1.0);
        assert!(outcome.died);
        assert_eq!(outcome.hours_applied, 0.0);
    }
}
