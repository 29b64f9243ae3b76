//! Engine configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyConfig;
use crate::playback::PlaybackSpeed;
use crate::rules::RulesConfig;
use crate::season::SeasonCalendar;

pub const CONFIG_DIR: &str = ".claimboard";
pub const CONFIG_FILE: &str = "config.yaml";

/// Main configuration, loaded from .claimboard/config.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimboardConfig {
    /// Config version
    pub version: Option<String>,

    /// Edge-matching tolerances for the adjacency indexer
    pub adjacency: AdjacencyConfig,

    /// Claim rule limits
    pub rules: RulesConfig,

    /// Season start instant
    pub season: SeasonCalendar,

    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub default_speed: PlaybackSpeed,
}

impl ClaimboardConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from project root (looks for .claimboard/config.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = Self::path_in(project_root);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn path_in(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Write the defaults to `.claimboard/config.yaml`, refusing to overwrite
    /// an existing file unless `force` is set.
    pub fn write_default(project_root: &Path, force: bool) -> Result<PathBuf> {
        let path = Self::path_in(project_root);
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        let dir = project_root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let body = serde_yaml::to_string(&Self {
            version: Some("1".to_string()),
            ..Self::default()
        })
        .context("Failed to serialize default config")?;
        let content = format!("# claimboard engine configuration\n{body}");
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(path)
    }
}
