//! Optional TOML configuration.
//!
//! Lookup order (first hit wins):
//! 1. an explicit path (the CLI's `--config`),
//! 2. `.bom-dagger.toml` in the working directory,
//! 3. `bom-dagger/config.toml` under the platform config directory.
//!
//! A missing file means defaults. An explicit path that does not exist is an
//! error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SbomError;
use crate::graph::BuildOptions;

pub const PROJECT_CONFIG_FILE: &str = ".bom-dagger.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Default output mode when no flag picks one.
    #[serde(default)]
    pub mode: Option<ModeSetting>,
    /// Emit JSON where the mode supports it.
    #[serde(default)]
    pub json: bool,
}

/// `[output] mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    Order,
    Groups,
    Dot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// Log dropped dependency references at WARN.
    #[serde(default)]
    pub warn_on_dangling: bool,
}

impl Config {
    #[must_use]
    pub const fn build_options(&self) -> BuildOptions {
        BuildOptions {
            warn_on_dangling: self.graph.warn_on_dangling,
        }
    }
}

/// Parse the config file at `path`.
///
/// # Errors
///
/// Returns [`SbomError::Config`] if the file cannot be read or parsed.
pub fn load_from_path(path: &Path) -> Result<Config, SbomError> {
    let content = std::fs::read_to_string(path).map_err(|e| SbomError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    toml::from_str::<Config>(&content).map_err(|e| SbomError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve and load the effective configuration.
///
/// # Errors
///
/// Returns [`SbomError::Config`] if `explicit` is given but unreadable, or if
/// any discovered file fails to parse.
pub fn load_config(explicit: Option<&Path>, working_dir: &Path) -> Result<Config, SbomError> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit config");
        return load_from_path(path);
    }

    match discover(working_dir, dirs::config_dir()) {
        Some(path) => {
            debug!(path = %path.display(), "loading discovered config");
            load_from_path(&path)
        }
        None => Ok(Config::default()),
    }
}

fn discover(working_dir: &Path, user_config_dir: Option<PathBuf>) -> Option<PathBuf> {
    let project = working_dir.join(PROJECT_CONFIG_FILE);
    if project.is_file() {
        return Some(project);
    }

    let user = user_config_dir?.join("bom-dagger/config.toml");
    user.is_file().then_some(user)
}
