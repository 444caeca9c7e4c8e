//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - status: one line per direction
//! - info: detailed progress of one direction
//! - watch: re-poll the run until interrupted
//! - products: images and plots a direction has produced
//! - legend: state colors

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// checkfactor - progress checker for Factor runs
#[derive(Parser, Debug)]
#[command(name = "checkfactor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Factor working directory (overrides the config)
    #[arg(short = 'w', long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Subcommand to execute; defaults to `status`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Log filter to use: `--verbose` raises it to debug
    pub fn log_level<'a>(&self, configured: Option<&'a str>) -> Option<&'a str> {
        if self.verbose { Some("debug") } else { configured }
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the state of every direction
    Status {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show detailed progress of one direction
    Info {
        /// Direction name (full or trimmed)
        direction: String,
    },

    /// Re-check all directions periodically; press Enter to refresh now
    Watch {
        /// Seconds between checks (overrides the config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Emit one JSON document per check
        #[arg(long)]
        json: bool,
    },

    /// List images and plots produced for a direction
    Products {
        /// Direction name (full or trimmed)
        direction: String,
    },

    /// Show the state colors
    Legend,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args falls back to status
        let cli = Cli::try_parse_from(["checkfactor"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.working_dir.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["checkfactor", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_verbose_raises_log_level() {
        let verbose = Cli::try_parse_from(["checkfactor", "--verbose", "status"]).unwrap();
        assert_eq!(verbose.log_level(Some("warn")), Some("debug"));
        assert_eq!(verbose.log_level(None), Some("debug"));

        let quiet = Cli::try_parse_from(["checkfactor", "status"]).unwrap();
        assert_eq!(quiet.log_level(Some("warn")), Some("warn"));
        assert_eq!(quiet.log_level(None), None);
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["checkfactor", "-c", "/path/to/checkfactor.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/checkfactor.yml")));
    }

    #[test]
    fn test_working_dir_is_global() {
        let cli = Cli::try_parse_from(["checkfactor", "status", "-w", "/data/run1"]).unwrap();
        assert_eq!(cli.working_dir, Some(PathBuf::from("/data/run1")));
    }

    #[test]
    fn test_status_command() {
        let cli = Cli::try_parse_from(["checkfactor", "status"]).unwrap();
        match cli.command {
            Some(Commands::Status { json }) => assert!(!json),
            _ => panic!("Expected status command"),
        }
    }

    #[test]
    fn test_status_json() {
        let cli = Cli::try_parse_from(["checkfactor", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { json: true })));
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::try_parse_from(["checkfactor", "info", "facet_patch_12"]).unwrap();
        match cli.command {
            Some(Commands::Info { direction }) => assert_eq!(direction, "facet_patch_12"),
            _ => panic!("Expected info command"),
        }
    }

    #[test]
    fn test_info_requires_direction() {
        assert!(Cli::try_parse_from(["checkfactor", "info"]).is_err());
    }

    #[test]
    fn test_watch_command() {
        let cli = Cli::try_parse_from(["checkfactor", "watch"]).unwrap();
        match cli.command {
            Some(Commands::Watch { interval, json }) => {
                assert!(interval.is_none());
                assert!(!json);
            }
            _ => panic!("Expected watch command"),
        }
    }

    #[test]
    fn test_watch_with_interval() {
        let cli = Cli::try_parse_from(["checkfactor", "watch", "-i", "15"]).unwrap();
        match cli.command {
            Some(Commands::Watch { interval, .. }) => assert_eq!(interval, Some(15)),
            _ => panic!("Expected watch command"),
        }
    }

    #[test]
    fn test_products_command() {
        let cli = Cli::try_parse_from(["checkfactor", "products", "field"]).unwrap();
        match cli.command {
            Some(Commands::Products { direction }) => assert_eq!(direction, "field"),
            _ => panic!("Expected products command"),
        }
    }

    #[test]
    fn test_legend_command() {
        let cli = Cli::try_parse_from(["checkfactor", "legend"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Legend)));
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["checkfactor", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}
