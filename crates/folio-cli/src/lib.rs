//! Command-line interface for Folio.
//!
//! # Key Abstractions
//!
//! - [`FolioCli`]: the application, generic over its config provider
//! - [`FolioConfig`]: file, environment and default configuration
//! - [`CliArgs`]: the clap argument tree

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;

pub use app::FolioCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::FolioConfig;
