//! `serve` and `validate`.

use std::fmt;
use std::net::SocketAddr;

use anyhow::{Result, bail};
use cornerstone_api::ConsoleConfig;
use tracing::info;

/// Severity of a configuration finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Works, but probably not what was intended.
    Warning,
    /// The server would not start or would misbehave.
    Error,
}

/// One problem found by [`check_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// How bad it is.
    pub severity: Severity,
    /// Config key concerned.
    pub key: &'static str,
    /// What is wrong.
    pub message: String,
}

impl Finding {
    fn warning(key: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            key,
            message: message.into(),
        }
    }

    fn error(key: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            key,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label}: {}: {}", self.key, self.message)
    }
}

/// Static checks on a loaded configuration.
pub fn check_config(config: &ConsoleConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    if config.server.bind.parse::<SocketAddr>().is_err() {
        findings.push(Finding::error(
            "server.bind",
            format!("'{}' is not a socket address", config.server.bind),
        ));
    }

    let data_dir = &config.storage.data_dir;
    if data_dir.as_os_str().is_empty() {
        findings.push(Finding::error("storage.data_dir", "must not be empty"));
    } else if data_dir.exists() && !data_dir.is_dir() {
        findings.push(Finding::error(
            "storage.data_dir",
            format!("{} is not a directory", data_dir.display()),
        ));
    } else if !data_dir.exists() {
        findings.push(Finding::warning(
            "storage.data_dir",
            format!("{} does not exist yet and will be created", data_dir.display()),
        ));
    }

    if config.auth.enabled {
        if config.auth.api_keys.is_empty() {
            findings.push(Finding::error(
                "auth.api_keys",
                "authentication is enabled but no API keys are configured",
            ));
        }
        if config.auth.api_keys.iter().any(|k| k.key.trim().is_empty()) {
            findings.push(Finding::error("auth.api_keys", "API keys must not be blank"));
        }
    } else {
        findings.push(Finding::warning(
            "auth.enabled",
            "authentication is disabled; every API route is open",
        ));
    }

    if !config.orbit.is_configured() {
        findings.push(Finding::warning(
            "orbit",
            "no default Orbit credentials; tenants must configure their own",
        ));
    }

    findings
}

/// Print findings and fail when any is an error.
pub fn validate(config: &ConsoleConfig) -> Result<()> {
    let findings = check_config(config);
    for finding in &findings {
        println!("{finding}");
    }
    let errors = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .count();
    if errors > 0 {
        bail!("configuration has {errors} error(s)");
    }
    println!("Configuration OK");
    Ok(())
}

/// Run the server until SIGINT or SIGTERM.
pub async fn serve(config: &ConsoleConfig) -> Result<()> {
    for finding in check_config(config) {
        match finding.severity {
            Severity::Warning => tracing::warn!("{finding}"),
            Severity::Error => bail!("{finding}"),
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Cornerstone console");
    cornerstone_api::serve(config, shutdown_signal()).await?;
    info!("Cornerstone console shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cornerstone_api::ConsoleConfig;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ConsoleConfig {
        let mut config = ConsoleConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config
    }

    fn errors(findings: &[Finding]) -> Vec<&'static str> {
        findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .map(|f| f.key)
            .collect()
    }

    #[test]
    fn test_defaults_only_warn() {
        let dir = TempDir::new().unwrap();
        let findings = check_config(&config_in(&dir));
        assert!(errors(&findings).is_empty());
        assert!(findings.iter().any(|f| f.key == "auth.enabled"));
    }

    #[test]
    fn test_bad_bind_is_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.server.bind = "localhost".into();
        assert_eq!(errors(&check_config(&config)), ["server.bind"]);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_auth_without_keys_is_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.auth.enabled = true;
        assert_eq!(errors(&check_config(&config)), ["auth.api_keys"]);
    }

    #[test]
    fn test_data_dir_file_is_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data");
        std::fs::write(&file, "").unwrap();
        let mut config = config_in(&dir);
        config.storage.data_dir = file;
        assert_eq!(errors(&check_config(&config)), ["storage.data_dir"]);
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding::error("server.bind", "bad");
        assert_eq!(finding.to_string(), "error: server.bind: bad");
    }
}
