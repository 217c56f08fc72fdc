//! Page-level command implementations.
//!
//! Every function returns its output instead of printing it, so the app
//! layer owns stdout.

use folio_content::aside::unterminated_markers;
use folio_content::{HelperRegistry, Pipeline, articles, find_aside_blocks, format_date};
use folio_core::resource::split_front_matter;
use folio_core::{Error, Result, Sitemap};
use std::path::Path;
use std::sync::Arc;

fn read_page(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))
}

/// Render a page file, skipping its front matter.
///
/// With `preprocess_only`, the preprocessed Markdown is returned instead
/// of HTML.
pub fn render_file(pipeline: &Pipeline, path: &Path, preprocess_only: bool) -> Result<String> {
    let text = read_page(path)?;
    let (_, body) = split_front_matter(&text);
    tracing::debug!(
        "rendering {} with steps {:?}",
        path.display(),
        pipeline.step_names()
    );
    if preprocess_only {
        pipeline.preprocess(body)
    } else {
        pipeline.render_page(body)
    }
}

/// Describe the aside blocks in a page.
///
/// Returns one line per block followed by one warning line per
/// unterminated start marker. Line numbers count from the top of the file.
pub fn check_file(path: &Path) -> Result<Vec<String>> {
    let text = read_page(path)?;
    let blocks = find_aside_blocks(&text);
    let unterminated = unterminated_markers(&text);

    let mut report: Vec<String> = blocks
        .iter()
        .map(|block| {
            format!(
                "{}:{}: aside block ({} lines)",
                path.display(),
                block.line,
                block.inner.lines().count()
            )
        })
        .collect();

    for line in &unterminated {
        tracing::warn!("{}:{line}: unterminated aside", path.display());
        report.push(format!(
            "{}:{line}: warning: [[aside never closed; left as plain text",
            path.display()
        ));
    }

    if report.is_empty() {
        report.push(format!("{}: no aside blocks", path.display()));
    }
    Ok(report)
}

/// List the articles under `dir` as `path\ttitle\tdate` lines.
///
/// Missing titles or dates print as empty columns. A date that does not
/// parse is an error naming the resource.
pub fn list_articles(dir: &Path) -> Result<Vec<String>> {
    let sitemap = Sitemap::scan(dir)?;
    articles(sitemap.resources())
        .map(|resource| {
            let title = resource.get_str("title").unwrap_or_default();
            let date = resource
                .get_str("date")
                .map(format_date)
                .transpose()
                .map_err(|e| match e {
                    Error::Parse { input, message } => {
                        Error::parse(input, format!("{}: {message}", resource.path))
                    }
                    other => other,
                })?
                .unwrap_or_default();
            Ok(format!("{}\t{title}\t{date}", resource.path))
        })
        .collect()
}

/// Names of the standard template helpers.
pub fn list_helpers() -> Vec<String> {
    HelperRegistry::standard(Arc::new(Sitemap::default()))
        .names()
        .into_iter()
        .map(String::from)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
