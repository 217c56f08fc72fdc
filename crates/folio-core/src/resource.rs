//! Site content resources.
//!
//! A [`Resource`] is one content page entry: a path relative to the source
//! directory plus whatever metadata its front matter declares. A [`Sitemap`]
//! is the ordered collection of every resource the site knows about.

use std::collections::BTreeMap;
use std::path::Path;

use glob::MatchOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// File extensions whose front matter is parsed into resource metadata.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// A content page entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Path relative to the source directory, `/`-separated.
    pub path: String,

    /// Opaque metadata, usually taken from front matter.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Resource {
    /// Create a resource with no metadata.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Look up a metadata value that is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// The full, ordered collection of site content resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sitemap {
    resources: Vec<Resource>,
}

impl Sitemap {
    /// Build a sitemap from resources, keeping their order.
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// All resources, in sitemap order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the sitemap is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Enumerate every file under `dir`, sorted by relative path.
    ///
    /// Hidden files are skipped. Markdown sources have their front matter
    /// parsed into the resource metadata.
    ///
    /// # Errors
    ///
    /// `NotFound` if `dir` is not a directory, `InvalidData` if a Markdown
    /// file carries malformed front matter, I/O errors otherwise.
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::not_found(format!(
                "content directory {}",
                dir.display()
            )));
        }

        let pattern = format!(
            "{}/**/*",
            glob::Pattern::escape(&dir.to_string_lossy())
        );
        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..MatchOptions::new()
        };
        let paths = glob::glob_with(&pattern, options)
            .map_err(|e| Error::config(format!("invalid scan pattern {pattern}: {e}")))?;

        let mut resources = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                Error::io_with_path(std::io::Error::from(e), path)
            })?;
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(dir).unwrap_or(&path);
            let resource_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let mut resource = Resource::new(resource_path);
            if is_markdown(&path) {
                let text =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                if let (Some(yaml), _) = split_front_matter(&text) {
                    resource.metadata = parse_front_matter(yaml).map_err(|e| {
                        Error::invalid_data(format!("{}: {e}", path.display()))
                    })?;
                }
            }
            log::trace!("scanned resource {}", resource.path);
            resources.push(resource);
        }

        resources.sort_by(|a, b| a.path.cmp(&b.path));
        log::debug!("scanned {} resources under {}", resources.len(), dir.display());
        Ok(Self { resources })
    }
}

impl FromIterator<Resource> for Sitemap {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext))
}

/// Separate a leading `---` front matter block from the document body.
///
/// Returns `(None, text)` unchanged when the text does not open with a
/// `---` line or the block is never closed.
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

/// Parse YAML front matter into a metadata map.
pub fn parse_front_matter(yaml: &str) -> Result<BTreeMap<String, Value>> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml_ng::from_str(yaml)
        .map_err(|e| Error::invalid_data(format!("front matter is not a mapping: {e}")))
}
