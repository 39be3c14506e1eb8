use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::analyze::PassSet;

pub const DEFAULT_SAMPLE_PATH: &str = "data/panda_ultraendgame_farming_v1.hsf";
pub const CONFIG_FILE_NAME: &str = "hsfscan.toml";

/// Settings read from `hsfscan.toml`. Command-line arguments win over these.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub path: Option<PathBuf>,
    pub passes: Vec<String>,
    pub format: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// `./hsfscan.toml` when it exists. A file that is present but unreadable
    /// or malformed is an error, not a fallback to defaults.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        Self::load_if_present(Path::new(CONFIG_FILE_NAME))
    }

    pub fn discover_in(dir: &Path) -> anyhow::Result<Option<Self>> {
        Self::load_if_present(&dir.join(CONFIG_FILE_NAME))
    }

    fn load_if_present(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Config::load(path).map(Some)
    }

    /// Pass selection from the file; an empty list means every pass.
    pub fn pass_set(&self) -> anyhow::Result<PassSet> {
        if self.passes.is_empty() {
            return Ok(PassSet::all());
        }
        PassSet::from_names(&self.passes).context("invalid `passes` in config")
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub path: PathBuf,
    pub passes: PassSet,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SAMPLE_PATH),
            passes: PassSet::all(),
        }
    }
}

impl AnalyzeOptions {
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}
