//! Folio Core: shared types, traits, and errors.
//!
//! This crate provides the foundational types used across all Folio crates.
//! It has no internal Folio dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`resource`]: Content resources and the sitemap
//! - [`traits`]: Core traits for site abstraction

#![doc = include_str!("../README.md")]

pub mod error;
pub mod resource;
pub mod traits;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use resource::{Resource, Sitemap};
pub use traits::ConfigProvider;
