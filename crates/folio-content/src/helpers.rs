//! Template helpers.
//!
//! Page templates look helpers up by name in a [`HelperRegistry`] that the
//! host passes into its template context. [`HelperRegistry::standard`]
//! provides the two site helpers:
//!
//! - `format_date(date)`: `"2023-03-05"` becomes `"March 5, 2023"`
//! - `articles()`: every resource whose path starts with `article`

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use folio_core::{Error, Resource, Result, Sitemap};
use serde_json::Value;

/// Output format of [`format_date`]: full month name, unpadded day, year.
pub const LONG_DATE_FORMAT: &str = "%B %-d, %Y";

/// Path prefix that marks a resource as an article.
pub const ARTICLE_PREFIX: &str = "article";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a year-month-day date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, RFC 3339 timestamps and
/// `YYYY-MM-DD HH:MM:SS`. Surrounding whitespace is ignored.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(timestamp.date());
    }

    Err(Error::parse(input, "expected a year-month-day date"))
}

/// Format a date string as `"<Month> <day>, <year>"`.
///
/// # Errors
///
/// [`Error::Parse`] when `date` is not a valid date.
pub fn format_date(date: &str) -> Result<String> {
    Ok(parse_date(date)?.format(LONG_DATE_FORMAT).to_string())
}

// ─── Articles ────────────────────────────────────────────────────────────────

/// Whether a resource is an article.
pub fn is_article(resource: &Resource) -> bool {
    resource.path.starts_with(ARTICLE_PREFIX)
}

/// The articles among `resources`, lazily and in their original order.
pub fn articles<'a, I>(resources: I) -> impl Iterator<Item = &'a Resource>
where
    I: IntoIterator<Item = &'a Resource>,
{
    resources.into_iter().filter(|resource| is_article(resource))
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// A registered helper function.
pub type HelperFn = Box<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Named helpers available to page templates.
#[derive(Default)]
pub struct HelperRegistry(BTreeMap<String, HelperFn>);

impl HelperRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// The site helpers, with `articles` drawing from `sitemap`.
    pub fn standard(sitemap: Arc<Sitemap>) -> Self {
        let mut registry = Self::new();

        registry.register("format_date", |args: &[Value]| {
            let date = single_str_arg("format_date", args)?;
            format_date(date).map(Value::String)
        });

        registry.register("articles", move |args: &[Value]| {
            if !args.is_empty() {
                return Err(Error::invalid_data(format!(
                    "articles takes no arguments, got {}",
                    args.len()
                )));
            }
            articles(sitemap.resources())
                .map(|resource| {
                    serde_json::to_value(resource).map_err(|e| Error::invalid_data(e.to_string()))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        });

        registry
    }

    /// Register (or replace) a helper.
    pub fn register<F>(&mut self, name: &str, func: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        if self.0.insert(name.to_string(), Box::new(func)).is_some() {
            log::warn!("template helper {name} replaced");
        }
        self
    }

    /// Look up a helper.
    pub fn get(&self, name: &str) -> Option<&HelperFn> {
        self.0.get(name)
    }

    /// Whether a helper is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Registered helper names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Call a helper by name.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown name, otherwise whatever the
    /// helper returns.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let helper = self
            .get(name)
            .ok_or_else(|| Error::not_found(format!("template helper '{name}'")))?;
        helper(args)
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HelperRegistry").field(&self.names()).finish()
    }
}

fn single_str_arg<'a>(helper: &str, args: &'a [Value]) -> Result<&'a str> {
    match args {
        [Value::String(s)] => Ok(s),
        [other] => Err(Error::invalid_data(format!(
            "{helper} expects a string argument, got {other}"
        ))),
        _ => Err(Error::invalid_data(format!(
            "{helper} expects 1 argument, got {}",
            args.len()
        ))),
    }
}
