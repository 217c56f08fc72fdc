//! The Folio CLI application.
//!
//! [`FolioCli`] owns the loaded configuration and the page pipeline built
//! from its Markdown options, and dispatches parsed [`CliArgs`].

use crate::cli::{CliArgs, Command};
use crate::commands;
use crate::config::FolioConfig;
use crate::config_handlers;
use folio_content::{MarkdownOptions, Pipeline, format_date};
use folio_core::Result;
use folio_core::traits::ConfigProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// FolioCli
// ============================================================================

/// CLI application parameterized over a config provider.
pub struct FolioCli<C: ConfigProvider> {
    name: String,
    config: Arc<C>,
    version: String,
    pipeline: Pipeline,
}

impl FolioCli<FolioConfig> {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = FolioConfig::load(args.config.as_deref())?;
        let options = config.markdown;
        Ok(Self::new(name, config, options))
    }
}

impl<C: ConfigProvider> FolioCli<C> {
    /// Create a new CLI application rendering with `options`.
    pub fn new(name: impl Into<String>, config: C, options: MarkdownOptions) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pipeline: Pipeline::with_asides(options),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Get a reference to the config provider.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// The page pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` if set, otherwise picks a level from the flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be installed (tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Render {
                file,
                preprocess_only,
            }) => {
                print!(
                    "{}",
                    commands::render_file(&self.pipeline, &file, preprocess_only)?
                );
                Ok(())
            }
            Some(Command::Check { file }) => print_lines(commands::check_file(&file)?),
            Some(Command::Date { date }) => {
                println!("{}", format_date(&date)?);
                Ok(())
            }
            Some(Command::Articles { dir }) => {
                let dir = self.articles_dir(dir)?;
                print_lines(commands::list_articles(&dir)?)
            }
            Some(Command::Helpers) => print_lines(commands::list_helpers()),
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }

    fn articles_dir(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        match explicit {
            Some(dir) => Ok(dir),
            None => self.config.source_path(),
        }
    }
}

fn print_lines(lines: Vec<String>) -> Result<()> {
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
