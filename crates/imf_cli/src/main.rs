//! imf-inspect - diagnostic inspector for IMF packages.
//!
//! Opens a package directory and prints a summary, the placed timeline or
//! the track file resolution of every resource.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use imf_core::config::{ConfigManager, Settings};
use imf_core::logging::{self, LogConfig, LogLevel};
use imf_core::Package;

mod report;

use report::{ResolutionLine, Summary, TimelineLine};

/// Command-line arguments for imf-inspect
#[derive(Parser, Debug)]
#[command(name = "imf-inspect")]
#[command(about = "Inspect IMF packages: composition timeline and asset resolution")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "IMF_INSPECT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print title, rate, duration and asset counts
    Summary {
        /// Package directory
        dir: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print one line per placed resource
    Timeline {
        /// Package directory
        dir: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resolve every track file resource to a file
    Resolve {
        /// Package directory
        dir: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write a default configuration file
    ConfigInit {
        /// Destination file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref())?;
    let mut log_config = LogConfig::from(&settings.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    logging::init_tracing_with(&log_config);

    match cli.command {
        Command::Summary { dir, json } => {
            let package = open(&dir, &settings)?;
            let summary = Summary::from_package(&package);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary);
            }
        }
        Command::Timeline { dir, json } => {
            let package = open(&dir, &settings)?;
            let lines = TimelineLine::collect(package.composition());
            if json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                for line in &lines {
                    println!("{}", line);
                }
            }
        }
        Command::Resolve { dir, json } => {
            let package = open(&dir, &settings)?;
            let lines = ResolutionLine::collect(&package);
            if json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                for line in &lines {
                    println!("{}", line);
                }
            }

            let failed = lines.iter().filter(|l| l.error.is_some()).count();
            if failed > 0 {
                bail!("{} of {} track file references could not be resolved", failed, lines.len());
            }
        }
        Command::ConfigInit { file } => {
            if file.exists() {
                bail!("Refusing to overwrite existing file {}", file.display());
            }
            let mut manager = ConfigManager::new(&file);
            manager
                .load_or_create()
                .with_context(|| format!("Failed to write config to {}", file.display()))?;
            println!("Wrote default configuration to {}", file.display());
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let mut manager = ConfigManager::new(path);
    manager
        .load()
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok(manager.into_settings())
}

fn open(dir: &Path, settings: &Settings) -> Result<Package> {
    debug!("Opening package {}", dir.display());
    Package::open_with(dir, &settings.discovery)
        .with_context(|| format!("Failed to open package {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summary_with_globals() {
        let cli = Cli::try_parse_from([
            "imf-inspect",
            "summary",
            "/pkg",
            "--json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        match cli.command {
            Command::Summary { dir, json } => {
                assert_eq!(dir, PathBuf::from("/pkg"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_config_init() {
        let cli = Cli::try_parse_from(["imf-inspect", "config-init", "imf.toml"]).unwrap();
        assert!(matches!(cli.command, Command::ConfigInit { .. }));
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["imf-inspect", "--log-level", "loud", "timeline", "/pkg"]).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_settings(Some(Path::new("/nonexistent/imf.toml"))).is_err());
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
