//! Command-line arguments.

use clap::{Parser, Subcommand};

/// Cornerstone console server and configuration tool.
#[derive(Parser, Debug)]
#[command(name = "cornerstone", version)]
#[command(about = "Cornerstone Network console server", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CORNERSTONE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Override `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Check the configuration without starting the server
    Validate,
    /// Inspect or edit the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved config file path
    Path,
    /// Print a value by dotted key, e.g. `server.bind`
    Get { key: String },
    /// Set a value by dotted key in the config file
    Set { key: String, value: String },
    /// Write a default config file
    Init {
        /// Target file instead of the default location
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as environment variables
    Export {
        /// Format as `--env KEY=value` for `docker run`, with secrets unmasked
        #[arg(long)]
        docker_env: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_bind() {
        let args = Args::try_parse_from(["cornerstone", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"
        ));
    }

    #[test]
    fn test_parse_config_set() {
        let args = Args::try_parse_from([
            "cornerstone",
            "--config",
            "/tmp/c.toml",
            "config",
            "set",
            "server.bind",
            "0.0.0.0:80",
        ])
        .unwrap();
        assert_eq!(args.config.as_deref(), Some("/tmp/c.toml"));
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigAction::Set { .. }
            }
        ));
    }

    #[test]
    fn test_command_is_required() {
        assert!(Args::try_parse_from(["cornerstone"]).is_err());
    }
}
