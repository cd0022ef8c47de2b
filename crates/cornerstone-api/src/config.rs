//! Console configuration.
//!
//! Loaded from TOML through [`ConfigManager`]; a missing file yields the
//! defaults below. Environment variables override individual values:
//!
//! | Variable | Key |
//! |---|---|
//! | `CORNERSTONE_BIND` | `server.bind` |
//! | `CORNERSTONE_DATA_DIR` | `storage.data_dir` |
//! | `CORNERSTONE_AUTH_ENABLED` | `auth.enabled` |
//! | `ORBIT_BASE_URL` | `orbit.base_url` |
//! | `ORBIT_LOB_ID` | `orbit.lob_id` |
//! | `ORBIT_API_KEY` | `orbit.api_key` |
//! | `GITHUB_API_BASE` | `github.api_base` |

use std::path::PathBuf;

use cornerstone_auth::AuthConfig;
use cornerstone_client::github::DEFAULT_API_BASE;
use cornerstone_core::model::OrbitSettings;
use cornerstone_core::{ConfigManager, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration of the console server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Where records are persisted.
    pub storage: StorageConfig,
    /// API-key authentication.
    pub auth: AuthConfig,
    /// Orbit credentials used when the tenant settings leave them empty.
    pub orbit: OrbitSettings,
    /// GitHub API endpoint for the VDR.
    pub github: GithubApiConfig,
    /// Log filter.
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per collection.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

/// GitHub API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubApiConfig {
    /// Base URL of the GitHub REST API.
    pub api_base: String,
}

impl Default for GithubApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: defaults::log_filter(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn bind() -> String {
        "127.0.0.1:8080".to_string()
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|dir| dir.join("cornerstone"))
            .unwrap_or_else(|| PathBuf::from("cornerstone-data"))
    }

    pub fn log_filter() -> String {
        "info,tower_http=debug".to_string()
    }
}

impl ConfigManager for ConsoleConfig {
    fn project_name() -> &'static str {
        "cornerstone"
    }

    fn secret_env_vars() -> &'static [&'static str] {
        &["ORBIT_API_KEY"]
    }

    fn apply_env_overrides_from(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = get("CORNERSTONE_BIND") {
            self.server.bind = bind;
        }
        if let Some(dir) = get("CORNERSTONE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(enabled) = get("CORNERSTONE_AUTH_ENABLED") {
            match enabled.parse() {
                Ok(enabled) => self.auth.enabled = enabled,
                Err(_) => log::warn!("Ignoring CORNERSTONE_AUTH_ENABLED={enabled}: not a boolean"),
            }
        }
        if let Some(url) = get("ORBIT_BASE_URL") {
            self.orbit.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(lob) = get("ORBIT_LOB_ID") {
            self.orbit.lob_id = lob;
        }
        if let Some(key) = get("ORBIT_API_KEY") {
            self.orbit.api_key = Some(key);
        }
        if let Some(base) = get("GITHUB_API_BASE") {
            self.github.api_base = base;
        }
    }

    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let mut vars = vec![
            ("CORNERSTONE_BIND".to_string(), self.server.bind.clone()),
            (
                "CORNERSTONE_DATA_DIR".to_string(),
                self.storage.data_dir.display().to_string(),
            ),
            (
                "CORNERSTONE_AUTH_ENABLED".to_string(),
                self.auth.enabled.to_string(),
            ),
            ("GITHUB_API_BASE".to_string(), self.github.api_base.clone()),
            ("RUST_LOG".to_string(), self.logging.filter.clone()),
        ];
        if !self.orbit.base_url.is_empty() {
            vars.push(("ORBIT_BASE_URL".to_string(), self.orbit.base_url.clone()));
        }
        if !self.orbit.lob_id.is_empty() {
            vars.push(("ORBIT_LOB_ID".to_string(), self.orbit.lob_id.clone()));
        }
        if let Some(key) = &self.orbit.api_key {
            vars.push(("ORBIT_API_KEY".to_string(), key.clone()));
        }
        Ok(vars)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.github.api_base, DEFAULT_API_BASE);
        assert!(!config.auth.enabled);
        assert!(!config.orbit.is_configured());
    }

    #[test]
    fn test_partial_toml() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            [server]
            bind = "0.0.0.0:9000"

            [orbit]
            base_url = "https://orbit.example"
            lob_id = "lob-1"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.orbit.lob_id, "lob-1");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_auth_keys_from_toml() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            [auth]
            enabled = true

            [[auth.api_keys]]
            name = "ops"
            key = "secret"
            "#,
        )
        .unwrap();
        assert!(config.auth.enabled);
        assert_eq!(config.auth.api_keys[0].name, "ops");
        assert!(config.auth.is_public("/health"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConsoleConfig::default();
        config.apply_env_overrides_from(&overrides(&[
            ("CORNERSTONE_BIND", "0.0.0.0:1234"),
            ("CORNERSTONE_DATA_DIR", "/srv/cornerstone"),
            ("CORNERSTONE_AUTH_ENABLED", "true"),
            ("ORBIT_BASE_URL", "https://orbit.example/"),
            ("ORBIT_LOB_ID", "lob-9"),
            ("ORBIT_API_KEY", "k"),
        ]));
        assert_eq!(config.server.bind, "0.0.0.0:1234");
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/cornerstone"));
        assert!(config.auth.enabled);
        assert_eq!(config.orbit.base_url, "https://orbit.example");
        assert!(config.orbit.is_configured());
    }

    #[test]
    fn test_env_overrides_ignore_blank_and_invalid() {
        let mut config = ConsoleConfig::default();
        config.apply_env_overrides_from(&overrides(&[
            ("CORNERSTONE_BIND", "  "),
            ("CORNERSTONE_AUTH_ENABLED", "maybe"),
        ]));
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn test_to_env_vars_skips_unset_orbit() {
        let vars = ConsoleConfig::default().to_env_vars().unwrap();
        let keys: Vec<_> = vars.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"CORNERSTONE_BIND"));
        assert!(!keys.contains(&"ORBIT_API_KEY"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ConsoleConfig::default();
        config.orbit.lob_id = "lob-1".to_string();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[server]"));
        assert_eq!(ConsoleConfig::from_toml_str(&text).unwrap(), config);
    }
}
