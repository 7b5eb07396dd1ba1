//! XM CLI - command-line client for the XM detection backend

mod commands;
mod config;
mod navigation;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use tracing::{Level, debug, error};
use xm_core::logging::{InstrumentationConfig, init_tracing};

#[derive(Parser)]
#[command(name = "xm")]
#[command(about = "Command-line client for the XM detection backend")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for stored credentials
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true, env = "XM_BASE_URL")]
    base_url: Option<String>,

    /// Client configuration file (TOML or YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level: Level = cli.log_level.into();
    let instrumentation = InstrumentationConfig {
        service_name: "xm".to_string(),
        ..InstrumentationConfig::from_env()
    }
    .with_log_level(level.as_str().to_lowercase());
    init_tracing(&instrumentation)?;

    let context = commands::Context {
        data_dir: config::resolve_data_dir(cli.data_dir),
        base_url: cli.base_url,
        config_file: cli.config,
        timeout: cli.timeout,
    };
    debug!(data_dir = %context.data_dir.display(), "Starting XM CLI");

    if let Err(e) = cli.command.execute(context).await {
        error!("Command failed: {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "xm",
            "--base-url",
            "http://localhost:9090",
            "-t",
            "5",
            "health",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:9090"));
        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(cli.command, Commands::Health));
    }

    #[test]
    fn test_parse_login() {
        let cli =
            Cli::try_parse_from(["xm", "login", "--token", "abc", "--username", "admin"]).unwrap();
        match cli.command {
            Commands::Login { token, username } => {
                assert_eq!(token, "abc");
                assert_eq!(username.as_deref(), Some("admin"));
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_parse_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["xm", "status", "-l", "debug"]).unwrap();
        assert_eq!(Level::from(cli.log_level), Level::DEBUG);
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["xm"]).is_err());
    }
}
