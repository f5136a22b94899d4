//! Save/Load functionality for persisting the pet
//!
//! The save is a flat JSON object. Loading never fails on content: each
//! field is checked on its own and replaced by its default when missing or
//! invalid, so one damaged value does not cost the whole pet. Only I/O
//! problems are errors.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use pipet_logic::stage::LifeStage;
use pipet_logic::state::PetState;
use pipet_logic::stats::{is_valid_stat, PetStats, StatKind};

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// On-disk layout of a save.
#[derive(Serialize)]
struct SaveRecord {
    version: u32,
    fullness: f64,
    happiness: f64,
    energy: f64,
    health: f64,
    discipline: f64,
    cleanliness: f64,
    is_alive: bool,
    is_sleeping: bool,
    is_sick: bool,
    life_stage: &'static str,
    birth_time: f64,
    last_update: f64,
    age_seconds: f64,
    care_mistakes: u32,
    neglected: bool,
}

impl SaveRecord {
    fn new(stats: &PetStats, state: &PetState, last_update: f64) -> Self {
        Self {
            version: SAVE_VERSION,
            fullness: f64::from(stats.fullness()),
            happiness: f64::from(stats.happiness()),
            energy: f64::from(stats.energy()),
            health: f64::from(stats.health()),
            discipline: f64::from(stats.discipline()),
            cleanliness: f64::from(stats.cleanliness()),
            is_alive: state.is_alive,
            is_sleeping: state.is_sleeping,
            is_sick: state.sick,
            life_stage: state.stage.as_str(),
            birth_time: state.birth_time,
            last_update,
            age_seconds: state.age_seconds,
            care_mistakes: state.care_mistakes,
            neglected: state.neglected,
        }
    }
}

/// Result of loading a pet
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPet {
    pub stats: PetStats,
    pub state: PetState,
    /// Epoch seconds of the last save. Catch-up runs from here.
    pub last_update: f64,
    /// Fields that were missing or invalid and got their default.
    pub repaired: Vec<&'static str>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("save encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write the pet to a writer
pub fn save_pet<W: Write>(
    writer: W,
    stats: &PetStats,
    state: &PetState,
    last_update: f64,
) -> Result<(), SaveError> {
    serde_json::to_writer_pretty(writer, &SaveRecord::new(stats, state, last_update))?;
    Ok(())
}

/// Read a pet from a reader, repairing bad fields.
///
/// `now` is the default for a missing `last_update`.
pub fn load_pet<R: Read>(mut reader: R, now: f64) -> Result<LoadedPet, SaveError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let doc = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            log::warn!("save is not a JSON object; using defaults");
            None
        }
        Err(e) => {
            log::warn!("save is not valid JSON ({e}); using defaults");
            None
        }
    };

    let mut fields = Fields::new(doc.as_ref());

    match fields.number("version", |v| v >= 1.0 && v.fract() == 0.0) {
        Some(v) if v > f64::from(SAVE_VERSION) => {
            log::warn!("save version {v} is newer than {SAVE_VERSION}; reading known fields");
        }
        _ => {}
    }

    let mut stats = PetStats::default();
    for kind in StatKind::ALL {
        if let Some(value) = fields.number(kind.as_str(), is_valid_stat) {
            stats.set(kind, value as f32);
        }
    }

    let last_update = fields
        .number("last_update", |v| v >= 0.0)
        .unwrap_or(now);
    let birth_time = fields
        .number("birth_time", |v| v >= 0.0 && v <= last_update)
        .unwrap_or(last_update);
    let age_seconds = fields
        .number("age_seconds", |v| v >= 0.0)
        .unwrap_or((last_update - birth_time).max(0.0));

    let is_alive = fields.flag("is_alive", true);
    let state = PetState {
        stage: fields.stage(),
        is_alive,
        is_sleeping: fields.flag("is_sleeping", false) && is_alive,
        sick: fields.flag("is_sick", false) && is_alive,
        birth_time,
        age_seconds,
        care_mistakes: fields.count("care_mistakes"),
        neglected: fields.flag("neglected", false),
    };

    let repaired = fields.repaired;
    if !repaired.is_empty() {
        log::warn!("repaired save fields: {}", repaired.join(", "));
    }

    Ok(LoadedPet {
        stats,
        state,
        last_update,
        repaired,
    })
}

/// Per-field reader that records every field it had to default.
struct Fields<'a> {
    doc: Option<&'a Map<String, Value>>,
    repaired: Vec<&'static str>,
}

impl<'a> Fields<'a> {
    fn new(doc: Option<&'a Map<String, Value>>) -> Self {
        Self {
            doc,
            repaired: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.doc.and_then(|map| map.get(key))
    }

    fn number(&mut self, key: &'static str, valid: impl Fn(f64) -> bool) -> Option<f64> {
        let value = self
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && valid(*v));
        if value.is_none() {
            self.repaired.push(key);
        }
        value
    }

    fn flag(&mut self, key: &'static str, default: bool) -> bool {
        match self.get(key).and_then(Value::as_bool) {
            Some(value) => value,
            None => {
                self.repaired.push(key);
                default
            }
        }
    }

    fn count(&mut self, key: &'static str) -> u32 {
        match self
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
        {
            Some(n) => n,
            None => {
                self.repaired.push(key);
                0
            }
        }
    }

    fn stage(&mut self) -> LifeStage {
        match self
            .get("life_stage")
            .and_then(Value::as_str)
            .and_then(|tag| tag.parse::<LifeStage>().ok())
        {
            Some(stage) => stage,
            None => {
                self.repaired.push("life_stage");
                LifeStage::Baby
            }
        }
    }
}

/// A save file on disk, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct SaveFile {
    path: PathBuf,
}

impl SaveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staging file next to the save: `<path>.tmp`.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write to the staging file, sync it, then rename it over the save.
    pub fn save(&self, stats: &PetStats, state: &PetState, timestamp: f64) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        save_pet(&mut writer, stats, state, timestamp)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        // Atomic rename
        fs::rename(&temp_path, &self.path)?;

        log::debug!("saved pet to {}", self.path.display());
        Ok(())
    }

    /// Load the save, or `None` if there is none yet.
    pub fn load(&self, now: f64) -> Result<Option<LoadedPet>, SaveError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let loaded = load_pet(BufReader::new(file), now)?;
        log::debug!(
            "loaded pet from {} (last update {:.0})",
            self.path.display(),
            loaded.last_update
        );
        Ok(Some(loaded))
    }
}
