//! CLI argument parsing and command definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for Folio.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "FOLIO_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Folio commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a Markdown page to HTML.
    Render {
        /// Markdown source file.
        file: PathBuf,

        /// Print the source after preprocessing instead of rendering it.
        #[arg(long)]
        preprocess_only: bool,
    },

    /// Report aside blocks and unterminated aside markers in a page.
    Check {
        /// Markdown source file.
        file: PathBuf,
    },

    /// Format a date the way page templates do.
    Date {
        /// Year-month-day date, e.g. 2023-03-05.
        date: String,
    },

    /// List article resources in the content directory.
    Articles {
        /// Content directory (defaults to the configured source_dir).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// List registered template helpers.
    Helpers,

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "markdown.autolink").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "markdown.autolink").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_args_default() {
        let args = CliArgs::parse_from(["folio"]);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_cli_args_flags() {
        let args = CliArgs::parse_from(["folio", "--verbose", "--config", "/tmp/folio.toml"]);
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("/tmp/folio.toml"));
    }

    #[test]
    fn test_render_command() {
        let args = CliArgs::parse_from(["folio", "render", "page.md"]);
        match args.command {
            Some(Command::Render {
                file,
                preprocess_only,
            }) => {
                assert_eq!(file, PathBuf::from("page.md"));
                assert!(!preprocess_only);
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn test_render_preprocess_only() {
        let args = CliArgs::parse_from(["folio", "render", "page.md", "--preprocess-only"]);
        assert!(matches!(
            args.command,
            Some(Command::Render {
                preprocess_only: true,
                ..
            })
        ));
    }

    #[test]
    fn test_check_command() {
        let args = CliArgs::parse_from(["folio", "check", "page.md"]);
        assert!(matches!(args.command, Some(Command::Check { .. })));
    }

    #[test]
    fn test_date_command() {
        let args = CliArgs::parse_from(["folio", "date", "2023-03-05"]);
        match args.command {
            Some(Command::Date { date }) => assert_eq!(date, "2023-03-05"),
            _ => panic!("Expected Date command"),
        }
    }

    #[test]
    fn test_articles_command() {
        let args = CliArgs::parse_from(["folio", "articles", "--dir", "content"]);
        match args.command {
            Some(Command::Articles { dir }) => assert_eq!(dir, Some(PathBuf::from("content"))),
            _ => panic!("Expected Articles command"),
        }
    }

    #[test]
    fn test_helpers_and_version_commands() {
        let args = CliArgs::parse_from(["folio", "helpers"]);
        assert!(matches!(args.command, Some(Command::Helpers)));
        let args = CliArgs::parse_from(["folio", "version"]);
        assert!(matches!(args.command, Some(Command::Version)));
    }

    // ------------------------------------------------------------------------
    // Config command tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_get_command() {
        let args = CliArgs::parse_from(["folio", "config", "get", "markdown.autolink"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Get { key },
            })) => assert_eq!(key, "markdown.autolink"),
            _ => panic!("Expected Config Get command"),
        }
    }

    #[test]
    fn test_config_set_command() {
        let args = CliArgs::parse_from(["folio", "config", "set", "build.dir", "public"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Set { key, value },
            })) => {
                assert_eq!(key, "build.dir");
                assert_eq!(value, "public");
            }
            _ => panic!("Expected Config Set command"),
        }
    }

    #[test]
    fn test_config_init_force() {
        let args = CliArgs::parse_from(["folio", "config", "init", "--force"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Init { file, force },
            })) => {
                assert!(file.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_config_export_docker_env() {
        let args = CliArgs::parse_from(["folio", "config", "export", "--docker-env"]);
        assert!(matches!(
            args.command,
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Export { docker_env: true },
            }))
        ));
    }
}
