//! Configuration for the Folio CLI.
//!
//! Provides the [`FolioConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! Apart from `project_name`, `source_dir` and `[markdown]`, every setting
//! here is consumed by the external site build pipeline; Folio only carries
//! it.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `FOLIO_CONFIG` environment variable
//! 3. XDG default: `~/.config/folio/config.toml`
//! 4. Built-in defaults

use confyg::{Confygery, env};
use folio_content::MarkdownOptions;
use folio_core::traits::ConfigProvider;
use folio_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output directory used when `build.dir` is not set.
pub const DEFAULT_BUILD_DIR: &str = "build";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for Folio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Project name, used for env var prefixes and default paths.
    pub project_name: String,

    /// Directory holding page sources.
    pub source_dir: String,

    /// Stylesheet directory, relative to `source_dir`.
    pub css_dir: String,

    /// Image directory, relative to `source_dir`.
    pub images_dir: String,

    /// Markdown dialect.
    pub markdown: MarkdownOptions,

    /// Build-time asset toggles.
    pub build: BuildConfig,
}

/// Output location and asset toggles for production builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Override of the build output directory (`FOLIO_BUILD_DIR`).
    pub dir: Option<String>,

    /// Minify stylesheets.
    pub minify_css: bool,

    /// Content-hash asset filenames.
    pub asset_hash: bool,

    /// Rewrite asset URLs to be relative.
    pub relative_assets: bool,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            project_name: "folio".to_string(),
            source_dir: "source".to_string(),
            css_dir: "css".to_string(),
            images_dir: "images".to_string(),
            markdown: MarkdownOptions::default(),
            build: BuildConfig::default(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dir: None,
            minify_css: true,
            asset_hash: true,
            relative_assets: true,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl FolioConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            tracing::debug!("loading config from {}", path.display());
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("FOLIO");
        env_opts.add_section("markdown");
        env_opts.add_section("build");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let mut merged: toml::Value = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        // Environment values always arrive as strings.
        let shape =
            toml::Value::try_from(Self::default()).map_err(|e| Error::config(e.to_string()))?;
        coerce_env_strings(&mut merged, &shape);

        merged
            .try_into()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("FOLIO_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("folio").join("config.toml"))
    }

    /// The effective build directory.
    pub fn build_dir(&self) -> &str {
        self.build.dir.as_deref().unwrap_or(DEFAULT_BUILD_DIR)
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `FOLIO_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "FOLIO", &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for FolioConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn source_path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(&self.source_dir))
    }

    fn build_path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.build_dir()))
    }
}

// ============================================================================
// Helper: env string coercion
// ============================================================================

/// Turn string leaves back into the scalar type `shape` has at the same key.
///
/// Strings that do not parse are left alone so deserialisation reports the
/// offending key.
fn coerce_env_strings(value: &mut toml::Value, shape: &toml::Value) {
    match (value, shape) {
        (toml::Value::Table(table), toml::Value::Table(shape)) => {
            for (key, val) in table.iter_mut() {
                if let Some(expected) = shape.get(key) {
                    coerce_env_strings(val, expected);
                }
            }
        }
        (val, expected) => {
            let Some(s) = val.as_str() else { return };
            let coerced = match expected {
                toml::Value::Boolean(_) => s.parse::<bool>().ok().map(toml::Value::Boolean),
                toml::Value::Integer(_) => s.parse::<i64>().ok().map(toml::Value::Integer),
                toml::Value::Float(_) => s.parse::<f64>().ok().map(toml::Value::Float),
                _ => None,
            };
            if let Some(coerced) = coerced {
                *val = coerced;
            }
        }
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
