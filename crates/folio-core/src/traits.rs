//! Core traits for Folio site abstraction.
//!
//! The primary trait is [`ConfigProvider`], which abstracts where a site
//! keeps its sources and where the external build pipeline writes output.

use std::path::PathBuf;

use crate::Result;

/// Trait for site configuration.
///
/// Every Folio front end implements this trait to tell the content layer
/// where page sources live and where built output goes.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use folio_core::traits::ConfigProvider;
/// use folio_core::Result;
///
/// #[derive(Clone)]
/// struct BlogConfig {
///     root: PathBuf,
/// }
///
/// impl ConfigProvider for BlogConfig {
///     fn project_name(&self) -> &str {
///         "blog"
///     }
///
///     fn source_path(&self) -> Result<PathBuf> {
///         Ok(self.root.join("source"))
///     }
///
///     fn build_path(&self) -> Result<PathBuf> {
///         Ok(self.root.join("build"))
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Directory holding page sources (Markdown with front matter).
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn source_path(&self) -> Result<PathBuf>;

    /// Directory the external build pipeline writes to.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn build_path(&self) -> Result<PathBuf>;
}
