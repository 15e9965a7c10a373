// Optional startup config; loaded once, never written back.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::{DEFAULT_BPM, DEFAULT_NOTE_DROPOUT, DEFAULT_ONSET_THRESHOLD};

const SYNCOPATE_DIR: &str = ".syncopate";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bpm: f32,
    pub note_dropout: f32,
    pub onset_threshold: f32,
    /// Directory holding the 808 one-shots referenced by the sample map.
    pub sample_dir: PathBuf,
    /// Weight table for the generator; None uses the built-in prior.
    pub model_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            note_dropout: DEFAULT_NOTE_DROPOUT,
            onset_threshold: DEFAULT_ONSET_THRESHOLD,
            sample_dir: PathBuf::from("assets/samples"),
            model_path: None,
        }
    }
}

// <project_dir>/.syncopate/config.json
fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(SYNCOPATE_DIR).join(CONFIG_FILE)
}

pub fn load_config(project_dir: &Path) -> Option<Config> {
    let path = config_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"bpm": 120.0}"#).unwrap();
        assert_eq!(config.bpm, 120.0);
        assert_eq!(config.note_dropout, DEFAULT_NOTE_DROPOUT);
        assert!(config.model_path.is_none());
    }
}
