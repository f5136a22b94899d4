//! Control-loop adapter: one pet, one save file, one clock.
//!
//! A front end owns a [`PetSession`], calls [`PetSession::tick`] on its own
//! cadence and forwards button presses to [`PetSession::act`]. Saving and
//! offline catch-up happen here so the front end never touches files.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use pipet_logic::actions::Action;
use pipet_logic::config::SimConfig;
use pipet_logic::lifecycle::PetEvent;

use crate::clock::Clock;
use crate::engine::{ActionOutcome, PetEngine, PetSnapshot, TickReport};
use crate::persistence::{SaveError, SaveFile};

/// Environment variable for [`SessionConfig::save_path`].
pub const ENV_SAVE_PATH: &str = "PIPET_SAVE_PATH";

/// Environment variable for [`SessionConfig::autosave_interval_seconds`].
pub const ENV_AUTOSAVE_SECONDS: &str = "PIPET_AUTOSAVE_SECONDS";

pub const DEFAULT_SAVE_PATH: &str = "pet_save.json";

/// Where and how often the session saves.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub save_path: PathBuf,
    /// Minimum real seconds between periodic autosaves.
    pub autosave_interval_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            autosave_interval_seconds: 5.0,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var(ENV_SAVE_PATH) {
            if !path.trim().is_empty() {
                config.save_path = PathBuf::from(path);
            }
        }
        if let Ok(raw) = env::var(ENV_AUTOSAVE_SECONDS) {
            match raw.trim().parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                    config.autosave_interval_seconds = secs;
                }
                _ => log::warn!("ignoring {ENV_AUTOSAVE_SECONDS}={raw:?}: expected seconds"),
            }
        }

        config
    }
}

/// Errors from session operations other than plain saves.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("the current pet is still alive")]
    PetAlive,
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// A running pet bound to a save file and a clock.
pub struct PetSession<C: Clock> {
    engine: PetEngine,
    save_file: SaveFile,
    clock: C,
    autosave_interval: f64,
    /// Clock reading the engine state corresponds to.
    last_tick: f64,
    last_save: f64,
    save_error: Option<SaveError>,
}

impl<C: Clock> PetSession<C> {
    /// Load the pet and apply offline catch-up, or hatch a new one.
    ///
    /// Only a failed load is an error. The result is then written like an
    /// autosave: a failed write is kept for [`Self::take_save_error`].
    pub fn start(config: SimConfig, session: SessionConfig, clock: C) -> Result<Self, SaveError> {
        let save_file = SaveFile::new(session.save_path);
        let now = clock.now();

        let engine = match save_file.load(now)? {
            Some(loaded) => {
                let mut engine = PetEngine::from_parts(config, loaded.stats, loaded.state);
                let elapsed = now - loaded.last_update;
                let hour = Self::start_hour(&clock, engine.config(), now, elapsed);
                let report = engine.advance_at(elapsed, hour);
                log::debug!(
                    "offline catch-up: {:.0}s applied, {:.0}s dropped, {} event(s)",
                    report.applied_seconds,
                    report.discarded_seconds,
                    report.events.len()
                );
                engine
            }
            None => {
                log::info!("no save at {}; a new pet hatched", save_file.path().display());
                PetEngine::new(config, now)
            }
        };

        let mut session = Self {
            engine,
            save_file,
            clock,
            autosave_interval: session.autosave_interval_seconds,
            last_tick: now,
            last_save: now,
            save_error: None,
        };
        session.autosave();
        Ok(session)
    }

    /// Advance by the real time since the previous tick.
    pub fn tick(&mut self) -> TickReport {
        let report = self.catch_up();

        let milestone = report
            .events
            .iter()
            .any(|e| {
                matches!(
                    e,
                    PetEvent::Died | PetEvent::Evolved { .. } | PetEvent::FellSick { .. }
                )
            });
        if milestone || self.last_tick - self.last_save >= self.autosave_interval {
            self.autosave();
        }

        report
    }

    /// Apply a user action; saves when it took effect.
    pub fn act(&mut self, action: Action) -> ActionOutcome {
        let outcome = self.engine.apply(action);
        if outcome.is_applied() {
            self.autosave();
        }
        outcome
    }

    /// Replace a dead pet with a newborn.
    pub fn new_pet(&mut self) -> Result<(), SessionError> {
        if self.engine.is_alive() {
            return Err(SessionError::PetAlive);
        }
        self.catch_up();

        let config = self.engine.config().clone();
        self.engine = PetEngine::new(config, self.last_tick);
        log::info!("a new pet hatched");

        self.save()?;
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), SaveError> {
        self.save_file
            .save(self.engine.stats(), self.engine.state(), self.last_tick)?;
        self.last_save = self.last_tick;
        Ok(())
    }

    /// Apply the time since the last tick and write a final save.
    pub fn shutdown(mut self) -> Result<(), SaveError> {
        self.catch_up();
        self.save()
    }

    /// The most recent failed autosave, if any.
    pub fn take_save_error(&mut self) -> Option<SaveError> {
        self.save_error.take()
    }

    pub fn snapshot(&self) -> PetSnapshot {
        self.engine.snapshot()
    }

    pub fn engine(&self) -> &PetEngine {
        &self.engine
    }

    pub fn save_file(&self) -> &SaveFile {
        &self.save_file
    }

    /// Advance to the current clock reading.
    ///
    /// A clock that moved backwards applies nothing and keeps `last_tick`,
    /// so the interval up to `last_tick` is not simulated twice.
    fn catch_up(&mut self) -> TickReport {
        let now = self.clock.now();
        if now < self.last_tick {
            log::debug!(
                "clock went back {:.0}s; waiting for it to pass the last tick",
                self.last_tick - now
            );
            return self.engine.advance(0.0);
        }
        let elapsed = now - self.last_tick;
        let hour = Self::start_hour(&self.clock, self.engine.config(), now, elapsed);
        self.last_tick = now;
        self.engine.advance_at(elapsed, hour)
    }

    /// Local hour where the applied part of an interval ending at `now`
    /// begins.
    fn start_hour(clock: &C, config: &SimConfig, now: f64, elapsed: f64) -> Option<f64> {
        let applied = config.clamp_elapsed(elapsed);
        let start = now - applied;
        start.is_finite().then(|| clock.hour_of_day(start))
    }

    fn autosave(&mut self) {
        if let Err(e) = self.save() {
            log::warn!("autosave to {} failed: {e}", self.save_file.path().display());
            self.save_error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pipet_logic::stage::LifeStage;
    use std::fs;
    use std::path::Path;

    // 2023-11-14 12:00:00 UTC, well clear of the night window
    const T0: f64 = 1_699_963_200.0;

    fn session_config(path: &Path) -> SessionConfig {
        SessionConfig {
            save_path: path.to_path_buf(),
            autosave_interval_seconds: 60.0,
        }
    }

    fn saved_last_update(path: &Path) -> f64 {
        SaveFile::new(path).load(0.0).unwrap().unwrap().last_update
    }

    #[test]
    fn test_start_hatches_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let clock = ManualClock::new(T0);

        let session = PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();
        assert!(path.exists());
        let snap = session.snapshot();
        assert_eq!(snap.stage, LifeStage::Baby);
        assert!(snap.is_alive);
        assert_eq!(saved_last_update(&path), T0);
    }

    #[test]
    fn test_tick_uses_elapsed_time() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(T0);
        let mut session = PetSession::start(
            SimConfig::default(),
            session_config(&dir.path().join("pet.json")),
            &clock,
        )
        .unwrap();

        clock.advance(3600.0);
        let report = session.tick();
        assert_eq!(report.applied_seconds, 3600.0);
        assert_eq!(session.snapshot().stats.fullness(), 42.0);

        // no time passed, nothing changes
        session.tick();
        assert_eq!(session.snapshot().stats.fullness(), 42.0);
    }

    #[test]
    fn test_autosave_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let clock = ManualClock::new(T0);
        let mut session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();

        clock.advance(30.0);
        session.tick();
        assert_eq!(saved_last_update(&path), T0);

        clock.advance(30.0);
        session.tick();
        assert_eq!(saved_last_update(&path), T0 + 60.0);
    }

    #[test]
    fn test_act_saves_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let clock = ManualClock::new(T0);
        let mut session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();

        assert!(session.act(Action::Feed).is_applied());
        let on_disk = SaveFile::new(&path).load(0.0).unwrap().unwrap();
        assert_eq!(on_disk.stats.fullness(), 70.0);

        // rejected actions do not write
        session.act(Action::Sleep);
        session.act(Action::Feed);
        let on_disk = SaveFile::new(&path).load(0.0).unwrap().unwrap();
        assert_eq!(on_disk.stats.fullness(), 70.0);
    }

    #[test]
    fn test_resume_applies_offline_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let clock = ManualClock::new(T0);

        let session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();
        session.shutdown().unwrap();

        clock.advance(3600.0);
        let session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.stats.fullness(), 42.0);
        assert_eq!(snap.stats.energy(), 85.0);
        assert!((snap.age_hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_offline_time_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let config = SimConfig {
            max_catchup_seconds: 7200.0,
            ..SimConfig::default()
        };
        let clock = ManualClock::new(T0);
        PetSession::start(config.clone(), session_config(&path), &clock)
            .unwrap()
            .shutdown()
            .unwrap();

        clock.advance(10.0 * 7200.0);
        let session = PetSession::start(config.clone(), session_config(&path), &clock).unwrap();

        let mut reference = PetEngine::new(config, T0);
        reference.advance(7200.0);
        assert_eq!(session.snapshot().stats, *reference.stats());
    }

    #[test]
    fn test_restart_without_elapsed_time_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let clock = ManualClock::new(T0);

        let mut session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();
        clock.advance(5000.0);
        session.tick();
        session.act(Action::Play);
        session.act(Action::Train);
        let before = session.snapshot();
        session.shutdown().unwrap();

        let session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_failed_autosave_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let path = sub.join("pet.json");
        let clock = ManualClock::new(T0);
        let mut session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();

        // replace the save directory with a plain file
        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, b"blocker").unwrap();

        assert!(session.act(Action::Feed).is_applied());
        assert_eq!(session.snapshot().stats.fullness(), 70.0);
        assert!(matches!(session.take_save_error(), Some(SaveError::Io(_))));
        assert!(session.take_save_error().is_none());
        assert!(session.save().is_err());
    }

    #[test]
    fn test_start_survives_blocked_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let clock = ManualClock::new(T0);
        PetSession::start(SimConfig::default(), session_config(&path), &clock)
            .unwrap()
            .shutdown()
            .unwrap();

        // a directory where the staging file goes makes every write fail
        let file = SaveFile::new(&path);
        fs::create_dir(file.temp_path()).unwrap();

        clock.advance(3600.0);
        let mut session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();
        assert_eq!(session.snapshot().stats.fullness(), 42.0);
        assert!(matches!(session.take_save_error(), Some(SaveError::Io(_))));
        // the old save is untouched
        assert_eq!(saved_last_update(&path), T0);
    }

    #[test]
    fn test_start_fails_when_save_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as a save
        let path = dir.path().join("pet.json");
        fs::create_dir(&path).unwrap();
        let clock = ManualClock::new(T0);
        assert!(PetSession::start(SimConfig::default(), session_config(&path), &clock).is_err());
    }

    #[test]
    fn test_clock_stepping_back_does_not_replay_decay() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(T0);
        let mut session = PetSession::start(
            SimConfig::default(),
            session_config(&dir.path().join("pet.json")),
            &clock,
        )
        .unwrap();

        clock.set(T0 + 3600.0);
        session.tick();
        clock.set(T0);
        let report = session.tick();
        assert_eq!(report.applied_seconds, 0.0);
        clock.set(T0 + 3600.0);
        let report = session.tick();
        assert_eq!(report.applied_seconds, 0.0);

        assert_eq!(session.snapshot().stats.fullness(), 42.0);
        assert!((session.snapshot().age_hours - 1.0).abs() < 1e-9);

        clock.set(T0 + 7200.0);
        session.tick();
        assert_eq!(session.snapshot().stats.fullness(), 34.0);
    }

    #[test]
    fn test_offline_night_drains_energy_faster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        // 23:00 UTC
        let clock = ManualClock::new(T0 + 11.0 * 3600.0);
        PetSession::start(SimConfig::default(), session_config(&path), &clock)
            .unwrap()
            .shutdown()
            .unwrap();

        clock.advance(3600.0);
        let session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();
        assert_eq!(session.snapshot().stats.energy(), 77.5);
    }

    #[test]
    fn test_new_pet_only_after_death() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.json");
        let clock = ManualClock::new(T0);
        let mut session =
            PetSession::start(SimConfig::default(), session_config(&path), &clock).unwrap();

        assert!(matches!(session.new_pet(), Err(SessionError::PetAlive)));

        // two days without care is fatal
        clock.advance(48.0 * 3600.0);
        let report = session.tick();
        assert!(report.events.contains(&PetEvent::Died));
        let on_disk = SaveFile::new(&path).load(0.0).unwrap().unwrap();
        assert!(!on_disk.state.is_alive);

        session.new_pet().unwrap();
        let snap = session.snapshot();
        assert!(snap.is_alive);
        assert_eq!(snap.stage, LifeStage::Baby);
        assert_eq!(snap.age_hours, 0.0);
        let on_disk = SaveFile::new(&path).load(0.0).unwrap().unwrap();
        assert!(on_disk.state.is_alive);
    }

    #[test]
    fn test_session_config_from_env() {
        env::set_var(ENV_SAVE_PATH, "/tmp/pipet-env-test.json");
        env::set_var(ENV_AUTOSAVE_SECONDS, "not-a-number");
        let config = SessionConfig::from_env();
        env::remove_var(ENV_SAVE_PATH);
        env::remove_var(ENV_AUTOSAVE_SECONDS);

        assert_eq!(config.save_path, PathBuf::from("/tmp/pipet-env-test.json"));
        assert_eq!(config.autosave_interval_seconds, 5.0);
    }
}
