//! Settings resolution: flags and environment, then the config file, then defaults.

use anyhow::{Context, Result};
use enginekit::ProjectContext;
use enginekit::backend::rest::endpoint_for_location;
use enginekit::names::DEFAULT_COLLECTION;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalArgs, OutputFormat};

/// Location used when none is configured.
pub const DEFAULT_LOCATION: &str = "global";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("gemctl"))
}

/// Optional `~/.config/gemctl/config.toml`.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub project: Option<String>,
    pub location: Option<String>,
    pub collection: Option<String>,
    pub format: Option<OutputFormat>,
    pub api_endpoint: Option<String>,
}

impl FileConfig {
    /// Load the config file, or defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join("config.toml");
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub project: Option<String>,
    pub location: String,
    pub collection: String,
    pub format: OutputFormat,
    pub api_endpoint: String,
    pub use_service_account: bool,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, file: &FileConfig) -> Self {
        let location = non_empty(args.location.as_ref())
            .or_else(|| non_empty(file.location.as_ref()))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let api_endpoint = non_empty(file.api_endpoint.as_ref())
            .unwrap_or_else(|| endpoint_for_location(&location));

        Self {
            project: non_empty(args.project.as_ref()).or_else(|| non_empty(file.project.as_ref())),
            collection: non_empty(args.collection.as_ref())
                .or_else(|| non_empty(file.collection.as_ref()))
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            format: args.format.or(file.format).unwrap_or_default(),
            api_endpoint,
            location,
            use_service_account: args.use_service_account,
        }
    }

    /// Project/location/collection to resolve short IDs against.
    pub fn project_context(&self) -> Result<ProjectContext> {
        let Some(project) = &self.project else {
            anyhow::bail!(
                "project is required: pass --project, set GOOGLE_CLOUD_PROJECT, \
                 or add `project` to ~/.config/gemctl/config.toml"
            );
        };
        Ok(ProjectContext::new(
            project.clone(),
            self.location.clone(),
            self.collection.clone(),
        ))
    }
}
