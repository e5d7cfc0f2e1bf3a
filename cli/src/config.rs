use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use stroke_core::RuleConfig;

pub const DEFAULT_CONFIG: &str = "stroke.toml";

/// Settings read from `stroke.toml`. Command-line flags win over these.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Stage table used when `--stages` is not given.
    pub stages: Option<PathBuf>,
    pub rules: RuleConfig,
}

impl Config {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("Failed to parse config")
    }

    /// Reads `path`, or the default config file when none is given.
    ///
    /// A missing default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG), false),
        };

        if !explicit && !path.exists() {
            log::debug!("No {DEFAULT_CONFIG} found, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)?;
        log::debug!("Loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Stage table path, preferring `explicit` over the configured one.
    pub fn stages_path(&self, explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        explicit
            .or_else(|| self.stages.clone())
            .context("No stage table given; pass --stages or set `stages` in stroke.toml")
    }
}
