//! PiPet Headless Simulation Harness
//!
//! Validates the pet engine and save file without a display.
//! Runs entirely in-process: no GPIO, no rendering.
//!
//! Usage:
//!   cargo run -p pipet-simtest
//!   cargo run -p pipet-simtest -- --verbose --seed 7
//!   cargo run -p pipet-simtest -- --live 30

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use pipet_core::prelude::*;
use pipet_logic::state::PetState;
use pipet_logic::stats::{STAT_MAX, STAT_MIN};

#[derive(Debug, Parser)]
#[command(name = "pipet-simtest")]
#[command(about = "Headless checks for the PiPet engine and save file")]
struct Args {
    /// Print every check, not just failures
    #[arg(short, long)]
    verbose: bool,

    /// Seed for the random action sequences
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Number of random sequences to fuzz
    #[arg(long, default_value_t = 200)]
    iterations: usize,

    /// After the checks, run a live session for this many ticks
    #[arg(long)]
    live: Option<u32>,

    /// Milliseconds between live ticks
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    println!("=== PiPet Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Clamp invariant under random play
    results.extend(validate_clamp_fuzz(args.seed, args.iterations));

    // 2. Decay rates
    results.extend(validate_decay());

    // 3. Catch-up bound
    results.extend(validate_catch_up());

    // 4. Evolution branches
    results.extend(validate_evolution());

    // 5. Save file
    results.extend(validate_persistence()?);

    // 6. Sickness and night
    results.extend(validate_sickness_and_night());

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }

    if let Some(ticks) = args.live {
        run_live(ticks, Duration::from_millis(args.tick_ms))?;
    }

    Ok(())
}

// ── 1. Clamp fuzz ───────────────────────────────────────────────────────

fn validate_clamp_fuzz(seed: u64, iterations: usize) -> Vec<TestResult> {
    println!("--- Clamp Fuzz (seed {seed}) ---");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut violations = 0usize;
    let mut steps = 0usize;
    let mut deaths = 0usize;

    for _ in 0..iterations {
        let config = SimConfig {
            time_scale: rng.gen_range(0.5..120.0),
            ..SimConfig::default()
        };
        let mut engine = PetEngine::new(config, 0.0);

        for _ in 0..rng.gen_range(10..80) {
            steps += 1;
            if rng.gen_bool(0.5) {
                if let Some(&action) = Action::ALL.choose(&mut rng) {
                    engine.apply(action);
                }
            } else {
                engine.advance(rng.gen_range(0.0..7200.0));
            }
            if !in_range(engine.stats()) {
                violations += 1;
            }
        }
        if !engine.is_alive() {
            deaths += 1;
        }
    }

    println!("  {iterations} sequences, {steps} steps, {deaths} deaths");
    vec![TestResult::check(
        "stats_stay_in_range",
        violations == 0,
        format!("{violations} out-of-range states in {steps} steps"),
    )]
}

fn in_range(stats: &PetStats) -> bool {
    StatKind::ALL
        .iter()
        .all(|k| (STAT_MIN..=STAT_MAX).contains(&stats.get(*k)))
}

// ── 2. Decay ────────────────────────────────────────────────────────────

fn validate_decay() -> Vec<TestResult> {
    println!("--- Decay ---");
    let mut results = Vec::new();
    let config = SimConfig::default();

    let mut engine = PetEngine::new(config.clone(), 0.0);
    engine.advance(3600.0);
    let s = engine.stats();
    let expected = [
        (StatKind::Fullness, 50.0 - config.decay.fullness),
        (StatKind::Happiness, 100.0 - config.decay.happiness),
        (StatKind::Energy, 100.0 - config.decay.energy),
        (StatKind::Discipline, 50.0 - config.decay.discipline),
        (StatKind::Cleanliness, 100.0 - config.decay.cleanliness),
    ];
    let wrong: Vec<_> = expected
        .iter()
        .filter(|(kind, want)| (s.get(*kind) - want).abs() > 1e-4)
        .map(|(kind, _)| kind.as_str())
        .collect();
    results.push(TestResult::check(
        "one_hour_rates",
        wrong.is_empty(),
        if wrong.is_empty() {
            "every stat dropped by its hourly rate".to_string()
        } else {
            format!("wrong: {}", wrong.join(", "))
        },
    ));

    let mut dirty_stats = PetStats::default();
    dirty_stats.set(StatKind::Cleanliness, 10.0);
    let mut dirty = PetEngine::from_parts(config.clone(), dirty_stats, PetState::newborn(0.0));
    let mut clean = PetEngine::new(config.clone(), 0.0);
    dirty.advance(4.0 * 3600.0);
    clean.advance(4.0 * 3600.0);
    results.push(TestResult::check(
        "dirt_costs_health",
        dirty.stats().health() < clean.stats().health(),
        format!(
            "dirty {:.1} vs clean {:.1}",
            dirty.stats().health(),
            clean.stats().health()
        ),
    ));

    let mut asleep = PetEngine::new(config, 0.0);
    asleep.sleep();
    asleep.advance(3600.0);
    results.push(TestResult::check(
        "sleep_restores_energy",
        asleep.stats().energy() == STAT_MAX && asleep.stats().fullness() > s.fullness(),
        format!(
            "energy {:.1}, fullness {:.1}",
            asleep.stats().energy(),
            asleep.stats().fullness()
        ),
    ));

    results
}

// ── 3. Catch-up ─────────────────────────────────────────────────────────

fn validate_catch_up() -> Vec<TestResult> {
    println!("--- Catch-up ---");
    let mut results = Vec::new();
    let config = SimConfig {
        max_catchup_seconds: 6.0 * 3600.0,
        ..SimConfig::default()
    };
    let cap = config.max_catchup_seconds;

    let mut far = PetEngine::new(config.clone(), 0.0);
    let mut exact = PetEngine::new(config.clone(), 0.0);
    let report = far.advance(10.0 * cap);
    exact.advance(cap);
    results.push(TestResult::check(
        "ten_caps_equal_one",
        far.stats() == exact.stats() && report.discarded_seconds == 9.0 * cap,
        format!("{:.0}s discarded", report.discarded_seconds),
    ));

    let mut once = PetEngine::new(config.clone(), 0.0);
    let mut split = PetEngine::new(config, 0.0);
    once.advance(5.0 * 3600.0);
    for _ in 0..5 {
        split.advance(3600.0);
    }
    let max_diff = StatKind::ALL
        .iter()
        .map(|k| (once.stats().get(*k) - split.stats().get(*k)).abs())
        .fold(0.0f32, f32::max);
    results.push(TestResult::check(
        "split_equals_single",
        max_diff < 0.01,
        format!("max difference {max_diff:.5}"),
    ));

    results
}

// ── 4. Evolution ────────────────────────────────────────────────────────

fn validate_evolution() -> Vec<TestResult> {
    println!("--- Evolution ---");
    let mut results = Vec::new();

    for (discipline, branch) in [(90.0, Branch::Disciplined), (40.0, Branch::FreeSpirited)] {
        let mut stats = PetStats::default();
        stats.set(StatKind::Discipline, discipline);
        let mut state = PetState::newborn(0.0);
        state.age_seconds = 200.0 * 3600.0;
        let mut engine = PetEngine::from_parts(SimConfig::default(), stats, state);
        let events = engine.advance(0.0).events;

        let name = format!("elder_{}", branch.as_str());
        results.push(TestResult::check(
            &name,
            engine.stage() == LifeStage::Elder(branch) && events.len() == 3,
            format!("{} after {} transitions", engine.stage(), events.len()),
        ));
    }

    let mut stats = PetStats::default();
    stats.set(StatKind::Happiness, 10.0);
    stats.set(StatKind::Health, 50.0);
    let mut state = PetState::newborn(0.0);
    state.age_seconds = 30.0 * 3600.0;
    let mut engine = PetEngine::from_parts(SimConfig::default(), stats, state);
    engine.advance(0.0);
    results.push(TestResult::check(
        "poor_care_blocks_growth",
        engine.stage() == LifeStage::Baby,
        format!("care {:.1}, stage {}", engine.stats().average_care(), engine.stage()),
    ));

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence() -> Result<Vec<TestResult>> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let dir = tempfile::tempdir().context("creating scratch directory")?;
    let path = dir.path().join("pet_save.json");
    let session_config = SessionConfig {
        save_path: path.clone(),
        ..SessionConfig::default()
    };
    let clock = ManualClock::new(1_700_000_000.0);

    let mut session = PetSession::start(SimConfig::default(), session_config.clone(), &clock)?;
    clock.advance(2.0 * 3600.0);
    session.tick();
    session.act(Action::Play);
    session.act(Action::Clean);
    let before = session.snapshot();
    session.shutdown()?;

    let session = PetSession::start(SimConfig::default(), session_config.clone(), &clock)?;
    results.push(TestResult::check(
        "restart_is_lossless",
        session.snapshot() == before,
        format!("{} at {:.2}h", before.stage, before.age_hours),
    ));
    drop(session);

    results.push(corrupt_field_check(&path, &session_config, &clock)?);

    Ok(results)
}

fn corrupt_field_check(
    path: &Path,
    session_config: &SessionConfig,
    clock: &ManualClock,
) -> Result<TestResult> {
    let raw = std::fs::read_to_string(path).context("reading save")?;
    let damaged = raw.replacen("\"energy\"", "\"energy_broken\"", 1);
    std::fs::write(path, damaged).context("writing damaged save")?;

    let loaded = SaveFile::new(path)
        .load(clock.now())?
        .context("save vanished")?;
    let session = PetSession::start(SimConfig::default(), session_config.clone(), clock)?;

    Ok(TestResult::check(
        "missing_field_repaired",
        loaded.repaired == ["energy"] && session.snapshot().stats.energy() == STAT_MAX,
        format!("repaired {:?}", loaded.repaired),
    ))
}

// ── 6. Sickness and night ───────────────────────────────────────────────

fn validate_sickness_and_night() -> Vec<TestResult> {
    println!("--- Sickness and night ---");
    let mut results = Vec::new();
    let config = SimConfig::default();

    let mut stats = PetStats::default();
    stats.set(StatKind::Fullness, 4.0);
    let mut engine = PetEngine::from_parts(config.clone(), stats, PetState::newborn(0.0));
    let events = engine.advance(3600.0).events;
    let fell_sick = events
        .iter()
        .any(|e| matches!(e, PetEvent::FellSick { .. }));
    results.push(TestResult::check(
        "starving_pet_falls_sick",
        fell_sick && engine.snapshot().is_sick,
        format!("{} event(s), health {:.1}", events.len(), engine.stats().health()),
    ));

    engine.feed();
    engine.give_medicine();
    results.push(TestResult::check(
        "care_cures_sickness",
        !engine.snapshot().is_sick,
        format!("health {:.1}", engine.stats().health()),
    ));

    let mut day = PetEngine::new(config.clone(), 0.0);
    let mut night = PetEngine::new(config, 0.0);
    day.advance_at(3600.0, Some(14.0));
    night.advance_at(3600.0, Some(2.0));
    results.push(TestResult::check(
        "night_drains_energy",
        night.stats().energy() < day.stats().energy(),
        format!(
            "night {:.1} vs day {:.1}",
            night.stats().energy(),
            day.stats().energy()
        ),
    ));

    results
}

// ── Live mode ───────────────────────────────────────────────────────────

fn run_live(ticks: u32, interval: Duration) -> Result<()> {
    let session_config = SessionConfig::from_env();
    let path = session_config.save_path.clone();
    let config = sim_config_from_env().context("loading tuning")?;
    let mut session = PetSession::start(config, session_config, SystemClock)
        .with_context(|| format!("starting session from {}", path.display()))?;
    if let Some(e) = session.take_save_error() {
        log::warn!("initial save failed: {e}");
    }

    println!("\n--- Live ({ticks} ticks) ---");
    for _ in 0..ticks {
        let report = session.tick();
        for event in &report.events {
            println!("  event: {event:?}");
        }
        if let Some(e) = session.take_save_error() {
            log::warn!("autosave failed: {e}");
        }

        let snap = session.snapshot();
        let s = snap.stats;
        println!(
            "  {:<22} F{:>5.1} H{:>5.1} E{:>5.1} HP{:>5.1} D{:>5.1} C{:>5.1}{}{}",
            snap.stage.to_string(),
            s.fullness(),
            s.happiness(),
            s.energy(),
            s.health(),
            s.discipline(),
            s.cleanliness(),
            if snap.is_sleeping { " zzz" } else { "" },
            if snap.is_sick { " sick" } else { "" }
        );
        if !snap.is_alive {
            println!("  the pet has passed away");
            break;
        }
        thread::sleep(interval);
    }

    session.shutdown().context("final save")?;
    Ok(())
}
