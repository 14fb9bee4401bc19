/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed application configuration
[POS]:    Configuration layer - storage location and autosave policy
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application configuration. Playback pace is deliberately absent: the tap
/// duration is a design constant, not a setting.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Directory holding the task store; platform data dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Persist the collection after every mutation
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave: default_autosave(),
        }
    }
}

fn default_autosave() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a YAML file. A missing file means defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
