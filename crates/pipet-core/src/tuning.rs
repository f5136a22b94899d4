//! Balance tuning loaded from a JSON file.
//!
//! The file holds a [`SimConfig`] document. Sections and fields left out
//! keep their defaults, so a tuning file only needs the numbers it changes:
//!
//! ```json
//! { "time_scale": 60.0, "decay": { "fullness": 4.0 } }
//! ```

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use pipet_logic::config::SimConfig;

/// Environment variable naming a tuning file for [`sim_config_from_env`].
pub const ENV_CONFIG_PATH: &str = "PIPET_CONFIG";

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("cannot read tuning file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid tuning file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read a tuning file.
pub fn load_tuning(path: impl AsRef<Path>) -> Result<SimConfig, TuningError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TuningError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| TuningError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("loaded tuning from {}", path.display());
    Ok(config)
}

/// Defaults, then the tuning file named by `PIPET_CONFIG` if set, then the
/// `PIPET_TIME_SCALE` and `PIPET_MAX_CATCHUP_SECONDS` overrides.
pub fn sim_config_from_env() -> Result<SimConfig, TuningError> {
    let base = match env::var(ENV_CONFIG_PATH) {
        Ok(path) if !path.trim().is_empty() => load_tuning(path.trim())?,
        _ => SimConfig::default(),
    };
    Ok(base.with_env_overrides())
}
