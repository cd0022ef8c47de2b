//! `cornerstone config` subcommands.
//!
//! The handlers are generic over [`ConfigManager`] and return the text to
//! print, so `main` owns stdout and tests can assert on the output.

use std::path::PathBuf;

use cornerstone_api::ConsoleConfig;
use cornerstone_core::model::REDACTED;
use cornerstone_core::{ConfigManager, Error, Result};

use crate::cli::ConfigAction;

// ============================================================================
// Dispatch
// ============================================================================

/// Run a config subcommand against [`ConsoleConfig`] and print the result.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    let output = match action {
        ConfigAction::Path => config_path_report::<ConsoleConfig>(config_path)?,
        ConfigAction::Get { key } => config_get::<ConsoleConfig>(config_path, &key)?,
        ConfigAction::Set { key, value } => {
            let path = config_set::<ConsoleConfig>(config_path, &key, &value)?;
            format!("Set {key} = {value} in {}", path.display())
        }
        ConfigAction::Init { file, force } => {
            let path = config_init::<ConsoleConfig>(file.as_deref().or(config_path), force)?;
            format!("Config file created at {}", path.display())
        }
        ConfigAction::Export { docker_env } => {
            config_export(&ConsoleConfig::load(config_path)?, docker_env)?
        }
    };
    println!("{output}");
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// The resolved config path, with a hint when the file is missing.
pub fn config_path_report<C: ConfigManager>(config_path: Option<&str>) -> Result<String> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))?;
    if path.exists() {
        Ok(path.display().to_string())
    } else {
        Ok(format!(
            "{}\n(file does not exist; run `{} config init` to create it)",
            path.display(),
            C::project_name()
        ))
    }
}

/// The effective value at a dotted key, environment overrides included.
pub fn config_get<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = C::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Write a value at a dotted key into the config file.
///
/// The result must still parse as `C`, so a typo in a value's type is
/// rejected before the file is touched.
pub fn config_set<C: ConfigManager>(
    config_path: Option<&str>,
    key: &str,
    value: &str,
) -> Result<PathBuf> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{} config init` first.",
            path.display(),
            C::project_name()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
    set_nested_value(&mut doc, key, parse_value(value))?;

    let rendered = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    C::from_toml_str(&rendered)
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;
    std::fs::write(&path, rendered).map_err(|e| Error::io_with_path(e, &path))?;

    log::debug!("Updated {key} in {}", path.display());
    Ok(path)
}

/// Write a config file holding the defaults.
pub fn config_init<C: ConfigManager>(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => C::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = C::default().to_toml_string()?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// One `KEY=value` line per variable.
///
/// Secrets are masked unless the output is meant for `docker run`.
pub fn config_export<C: ConfigManager>(config: &C, docker_env: bool) -> Result<String> {
    let lines: Vec<String> = config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| {
            if docker_env {
                format!("--env {key}={value}")
            } else if C::secret_env_vars().contains(&key.as_str()) {
                format!("{key}={REDACTED}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

// ============================================================================
// Dotted keys
// ============================================================================

/// Follow a dotted key through nested tables.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key, creating intermediate tables.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a command-line value: bool, then integer, then float, then string.
pub fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => s
            .parse::<i64>()
            .map(toml::Value::Integer)
            .or_else(|_| s.parse::<f64>().map(toml::Value::Float))
            .unwrap_or_else(|_| toml::Value::String(s.to_string())),
    }
}

/// Scalars print bare; tables and arrays print as TOML.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
