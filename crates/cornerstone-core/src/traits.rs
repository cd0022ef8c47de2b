//! Configuration management trait.
//!
//! A `ConfigManager` is a serde-backed TOML configuration with a
//! predictable file location and environment overrides. The CLI's
//! `config` subcommands are generic over it.

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// A TOML configuration file with defaults and environment overrides.
pub trait ConfigManager: Default + Serialize + DeserializeOwned + Sized {
    /// Project name, used for the config directory and env prefix.
    fn project_name() -> &'static str;

    /// Apply overrides read through `lookup` (normally the process env).
    fn apply_env_overrides_from(&mut self, lookup: &dyn Fn(&str) -> Option<String>);

    /// Flatten into `KEY=value` pairs for `config export`.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>>;

    /// Variables from [`to_env_vars`](Self::to_env_vars) that hold secrets.
    fn secret_env_vars() -> &'static [&'static str] {
        &[]
    }

    /// Environment variable naming an explicit config file.
    fn config_env_var() -> String {
        format!(
            "{}_CONFIG",
            Self::project_name().to_uppercase().replace(['-', ' '], "_")
        )
    }

    /// Default config path: `<config_dir>/<project>/config.toml`.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config path: explicit argument, then env var, then default.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(Self::config_env_var())
            && !path.is_empty()
        {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Load from disk (defaults when the file is missing), then apply
    /// environment overrides.
    fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                Self::from_toml_str(&content).map_err(|e| match e {
                    Error::Config { message } => {
                        Error::config(format!("Failed to parse {}: {message}", path.display()))
                    }
                    other => other,
                })?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides_from(&|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse from a TOML string without applying overrides.
    fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize as pretty TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}
