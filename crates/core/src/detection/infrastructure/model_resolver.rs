use std::path::{Path, PathBuf};

use crate::detection::domain::errors::ConfigError;
use crate::shared::constants::{APP_DIR_NAME, SYSTEM_MODEL_DIR};

/// Locates a named model file inside `model_dir`.
pub fn model_file(model_dir: &Path, name: &str) -> Result<PathBuf, ConfigError> {
    let path = model_dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::ModelNotFound(path))
    }
}

/// Directories searched for models when none is given, in priority order.
///
/// - User data directory: `$XDG_DATA_HOME/odetect/models/` on Linux,
///   `~/Library/Application Support/odetect/models/` on macOS,
///   `%APPDATA%/odetect/models/` on Windows
/// - System install location: `/usr/share/odetect`
pub fn default_model_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(2);
    if let Some(data) = dirs::data_dir() {
        dirs.push(data.join(APP_DIR_NAME).join("models"));
    }
    dirs.push(PathBuf::from(SYSTEM_MODEL_DIR));
    dirs
}

/// Picks the model directory.
///
/// An explicit directory always wins, existing or not, so that a missing
/// model is reported against the path the user asked for. Otherwise the
/// first existing default directory is used, falling back to the system
/// location.
pub fn resolve_model_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    let candidates = default_model_dirs();
    pick_existing(&candidates).unwrap_or_else(|| PathBuf::from(SYSTEM_MODEL_DIR))
}

fn pick_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|dir| dir.is_dir()).cloned()
}
