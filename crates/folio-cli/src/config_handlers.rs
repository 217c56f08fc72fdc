//! Handlers for `folio config {path,get,set,init,export}`.
//!
//! Each handler returns the text it would print so the dispatch in
//! [`handle_config_command`] is the only place that writes to stdout.

use crate::cli::ConfigAction;
use crate::config::FolioConfig;
use folio_core::{Error, Result};
use std::path::{Path, PathBuf};

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Takes the raw `--config` path rather than a loaded config because
/// `path` and `init` must work before any config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    let output = match action {
        ConfigAction::Path => {
            let path = config_file_path(config_path)?;
            if !path.exists() {
                eprintln!("(no file yet; run `folio config init` to create it)");
            }
            path.display().to_string()
        }
        ConfigAction::Get { key } => config_get(&FolioConfig::load(config_path)?, &key)?,
        ConfigAction::Set { key, value } => {
            let path = config_file_path(config_path)?;
            config_set(&path, &key, &value)?;
            format!("Set {key} = {value} in {}", path.display())
        }
        ConfigAction::Init { file, force } => {
            let path = match file {
                Some(p) => PathBuf::from(p),
                None => config_file_path(None)?,
            };
            config_init(&path, force)?;
            format!("Config file created at {}", path.display())
        }
        ConfigAction::Export { docker_env } => {
            config_export(&FolioConfig::load(config_path)?, docker_env)?.join("\n")
        }
    };
    println!("{output}");
    Ok(())
}

// ============================================================================
// Command handlers
// ============================================================================

fn config_file_path(config_path: Option<&str>) -> Result<PathBuf> {
    FolioConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
}

/// Look up a dotted key in the effective configuration.
fn config_get(config: &FolioConfig, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Write a dotted key into an existing config file.
///
/// The edited document must still load as a [`FolioConfig`]; a value of
/// the wrong type (say `markdown.autolink = "sometimes"`) is refused and
/// the file is left untouched. A value that looks like a number or bool but
/// only fits as a string (say `build.dir = 2024`) is stored as a string.
fn config_set(path: &Path, key: &str, value: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `folio config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    let typed = parse_value(value);
    let fallback = !typed.is_str();
    let toml_str = match with_value(&doc, key, typed) {
        Ok(toml_str) => toml_str,
        Err(_) if fallback => with_value(&doc, key, toml::Value::String(value.to_string()))?,
        Err(e) => return Err(e),
    };

    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))?;
    tracing::debug!("updated {key} in {}", path.display());
    Ok(())
}

/// Render `doc` with `key` set to `value`, if the result is a valid config.
fn with_value(doc: &toml::Value, key: &str, value: toml::Value) -> Result<String> {
    let mut doc = doc.clone();
    set_nested_value(&mut doc, key, value)?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    toml::from_str::<FolioConfig>(&toml_str)
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;
    Ok(toml_str)
}

/// Write the default configuration to `path`.
fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = FolioConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
}

fn config_export(config: &FolioConfig, docker_env: bool) -> Result<Vec<String>> {
    Ok(config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| {
            if docker_env {
                format!("--env {key}={value}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect())
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("Cannot navigate into '{part}' in '{key}'")))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config(format!("Cannot set '{key}' on a non-table value")))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value: bool, then integer, then float,
/// then string.
fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => s
            .parse::<i64>()
            .map(toml::Value::Integer)
            .or_else(|_| s.parse::<f64>().map(toml::Value::Float))
            .unwrap_or_else(|_| toml::Value::String(s.to_string())),
    }
}

fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
