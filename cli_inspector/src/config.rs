//! Inspector settings: which engine to launch and how to draw the game.
//!
//! Resolved from `--settings`, then `HALITE_INSPECTOR_SETTINGS`, then
//! `settings.json` in the working directory, then the builtin defaults.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_INSPECTOR_SETTINGS: &str = include_str!("data/inspector_settings.json");
pub const SETTINGS_ENV_VAR: &str = "HALITE_INSPECTOR_SETTINGS";
pub const WORKING_DIR_SETTINGS: &str = "settings.json";

pub const DEFAULT_SLEEP_MS: i64 = 10;
/// Sleeps below this make the engine outrun the viewer.
pub const RECOMMENDED_MIN_SLEEP_MS: i64 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InspectorSettings {
    pub engine: PathBuf,
    /// Milliseconds the engine waits between turns in viewer mode.
    pub sleep: Option<i64>,
    /// Passed to the engine before the arguments given on the command line.
    pub engine_args: Vec<String>,
    pub prefs: ViewerPrefs,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            engine: PathBuf::from("halite"),
            sleep: Some(DEFAULT_SLEEP_MS),
            engine_args: Vec::new(),
            prefs: ViewerPrefs::default(),
        }
    }
}

impl InspectorSettings {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_INSPECTOR_SETTINGS)
            .expect("builtin inspector settings should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = InspectorSettings::from_json_str(&contents)?;
        Ok(settings)
    }

    /// Effective sleep; a missing or negative value falls back to the default.
    pub fn sleep_ms(&self) -> i64 {
        match self.sleep {
            Some(sleep) if sleep >= 0 => sleep,
            _ => DEFAULT_SLEEP_MS,
        }
    }

    /// Full engine argument list for viewer mode.
    pub fn engine_command_args(&self, user_args: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(self.engine_args.len() + user_args.len() + 3);
        args.push("--viewer".to_string());
        args.extend(self.engine_args.iter().cloned());
        args.extend(user_args.iter().cloned());
        args.push("--sleep".to_string());
        args.push(self.sleep_ms().to_string());
        args
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse inspector settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read inspector settings from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the active settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    Flag(PathBuf),
    Env(PathBuf),
    WorkingDir(PathBuf),
    Builtin,
}

pub fn load_settings(
    flag_path: Option<&Path>,
) -> Result<(InspectorSettings, SettingsSource), SettingsError> {
    if let Some(path) = flag_path {
        let settings = InspectorSettings::from_file(path)?;
        return Ok((settings, SettingsSource::Flag(path.to_path_buf())));
    }

    if let Some(path) = env::var_os(SETTINGS_ENV_VAR).map(PathBuf::from) {
        let settings = InspectorSettings::from_file(&path)?;
        return Ok((settings, SettingsSource::Env(path)));
    }

    let local = PathBuf::from(WORKING_DIR_SETTINGS);
    if local.exists() {
        let settings = InspectorSettings::from_file(&local)?;
        return Ok((settings, SettingsSource::WorkingDir(local)));
    }

    Ok((InspectorSettings::builtin(), SettingsSource::Builtin))
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewerPrefs {
    pub grid_aesthetic: GridAesthetic,
    /// Show the engine's 1-based turn numbers instead of zero-based ones.
    pub turns_start_at_one: bool,
}

/// How cell halite maps to a grey level.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GridAesthetic {
    Flat,
    Linear,
    #[default]
    Sqrt2048,
    Sqrt1024,
}

impl GridAesthetic {
    pub fn next(self) -> Self {
        match self {
            GridAesthetic::Flat => GridAesthetic::Linear,
            GridAesthetic::Linear => GridAesthetic::Sqrt2048,
            GridAesthetic::Sqrt2048 => GridAesthetic::Sqrt1024,
            GridAesthetic::Sqrt1024 => GridAesthetic::Flat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GridAesthetic::Flat => "flat",
            GridAesthetic::Linear => "linear",
            GridAesthetic::Sqrt2048 => "sqrt/2048",
            GridAesthetic::Sqrt1024 => "sqrt/1024",
        }
    }

    pub fn shade(self, halite: i64) -> u8 {
        let halite = halite.max(0) as f64;
        let value = match self {
            GridAesthetic::Flat => 0.0,
            GridAesthetic::Linear => halite / 4.0,
            GridAesthetic::Sqrt2048 => 255.0 * (halite / 2048.0).sqrt(),
            GridAesthetic::Sqrt1024 => 255.0 * (halite / 1024.0).sqrt(),
        };
        value.floor().min(255.0) as u8
    }
}
