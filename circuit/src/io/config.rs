//! Tool configuration stored in a TOML file (e.g. `circuit.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::runner::DEFAULT_MAX_STEPS;

/// Level tooling configuration (TOML).
///
/// Every field is optional in the file; missing fields fall back to defaults.
/// Relative paths are resolved by the caller.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitConfig {
    /// Tileset (`.tsj`) used to decode level files.
    pub tileset: Option<PathBuf>,

    /// Directory scanned for player-made levels.
    pub custom_levels_dir: Option<PathBuf>,

    /// Cap on runner steps per execution.
    pub max_steps: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            tileset: None,
            custom_levels_dir: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl CircuitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(anyhow!("max_steps must be > 0"));
        }
        if self
            .tileset
            .as_ref()
            .is_some_and(|tileset| tileset.as_os_str().is_empty())
        {
            return Err(anyhow!("tileset must be a non-empty path"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CircuitConfig::default()`.
pub fn load_config(path: &Path) -> Result<CircuitConfig> {
    if !path.exists() {
        let cfg = CircuitConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CircuitConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
