//! Page rendering pipeline.
//!
//! A [`Pipeline`] owns the site renderer and an ordered list of
//! [`Preprocessor`] steps. Each page source runs through every step, then
//! the result is rendered as a whole with the same renderer. Steps are
//! registered explicitly; the aside transform is just the first of them in
//! the site pipeline.

use std::fmt;
use std::sync::Arc;

use folio_core::Result;

use crate::aside::AsideBlocks;
use crate::options::MarkdownOptions;
use crate::render::{MarkdownRenderer, Render};

/// A text-to-text step run on a page source before Markdown rendering.
pub trait Preprocessor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Transform the raw document. Must not depend on state from other calls.
    fn preprocess(&self, document: &str) -> Result<String>;

    /// Transform the document as part of a full page render.
    ///
    /// Steps that emit finished HTML spanning several lines park it in
    /// `stash` and leave a placeholder line, so the final Markdown pass
    /// cannot re-parse it. Defaults to [`Preprocessor::preprocess`].
    fn preprocess_page(&self, document: &str, _stash: &mut HtmlStash) -> Result<String> {
        self.preprocess(document)
    }
}

/// Finished HTML fragments held back from the final Markdown pass.
///
/// Each fragment is replaced by an HTML comment. A comment line is a
/// Markdown HTML block that runs to its `-->`, so it survives rendering
/// byte for byte, blank lines in the fragment notwithstanding.
#[derive(Debug, Default)]
pub struct HtmlStash {
    fragments: Vec<String>,
}

impl HtmlStash {
    /// Hold `html` back and return the placeholder to put in its place.
    pub fn protect(&mut self, html: String) -> String {
        let placeholder = Self::placeholder(self.fragments.len());
        self.fragments.push(html);
        placeholder
    }

    /// Number of fragments held.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Put every held fragment back into rendered `html`.
    pub fn restore(&self, mut html: String) -> String {
        for (index, fragment) in self.fragments.iter().enumerate() {
            html = html.replace(&Self::placeholder(index), fragment);
        }
        html
    }

    fn placeholder(index: usize) -> String {
        format!("<!--folio-stash-{index}-->")
    }
}

/// The Markdown-rendering hook a host page pipeline calls per page.
pub struct Pipeline {
    renderer: MarkdownRenderer,
    steps: Vec<Box<dyn Preprocessor>>,
}

impl Pipeline {
    /// A pipeline with no preprocessing steps.
    pub fn new(options: MarkdownOptions) -> Self {
        Self::from_renderer(MarkdownRenderer::new(options))
    }

    /// A pipeline around an existing renderer.
    pub fn from_renderer(renderer: MarkdownRenderer) -> Self {
        Self {
            renderer,
            steps: Vec::new(),
        }
    }

    /// The site pipeline: aside blocks rendered with the page renderer.
    pub fn with_asides(options: MarkdownOptions) -> Self {
        let renderer = MarkdownRenderer::from_shared(Arc::new(options));
        let asides = AsideBlocks::new(renderer.clone());
        let mut pipeline = Self::from_renderer(renderer);
        pipeline.register(asides);
        pipeline
    }

    /// Append a preprocessing step.
    pub fn register<P: Preprocessor + 'static>(&mut self, step: P) -> &mut Self {
        log::debug!("registered preprocessor {}", step.name());
        self.steps.push(Box::new(step));
        self
    }

    /// The renderer used for the final pass.
    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    /// Names of registered steps, in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every preprocessing step over `document`.
    pub fn preprocess(&self, document: &str) -> Result<String> {
        let mut current = document.to_string();
        for step in &self.steps {
            current = step.preprocess(&current)?;
            log::trace!("{} produced {} bytes", step.name(), current.len());
        }
        Ok(current)
    }

    /// Preprocess then render a full page to HTML.
    ///
    /// HTML produced by the steps is kept out of the final Markdown pass
    /// and spliced back into its output.
    pub fn render_page(&self, document: &str) -> Result<String> {
        let mut stash = HtmlStash::default();
        let mut current = document.to_string();
        for step in &self.steps {
            current = step.preprocess_page(&current, &mut stash)?;
        }
        let html = self.renderer.render(&current)?;
        if !stash.is_empty() {
            log::trace!("restoring {} protected fragment(s)", stash.len());
        }
        Ok(stash.restore(html))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_asides(MarkdownOptions::default())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", self.renderer.options())
            .field("steps", &self.step_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Error;

    struct Shout;

    impl Preprocessor for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn preprocess(&self, document: &str) -> Result<String> {
            Ok(document.replace("hello", "HELLO"))
        }
    }

    struct Broken;

    impl Preprocessor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn preprocess(&self, _document: &str) -> Result<String> {
            Err(Error::render("step failed"))
        }
    }

    #[test]
    fn test_empty_pipeline_preprocess_is_identity() {
        let pipeline = Pipeline::new(MarkdownOptions::default());
        let doc = "[[aside\nx\naside]]\n";
        assert_eq!(pipeline.preprocess(doc).unwrap(), doc);
        assert!(pipeline.step_names().is_empty());
    }

    #[test]
    fn test_site_pipeline_steps() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.step_names(), vec!["aside_blocks"]);
    }

    #[test]
    fn test_site_pipeline_preprocess_keeps_markdown_outside_asides() {
        let pipeline = Pipeline::default();
        let out = pipeline
            .preprocess("# Title\n[[aside\n**note**\naside]]\n*after*\n")
            .unwrap();
        assert_eq!(
            out,
            "# Title\n<aside><p><strong>note</strong></p>\n</aside>\n*after*\n"
        );
    }

    #[test]
    fn test_render_page() {
        let pipeline = Pipeline::default();
        let html = pipeline
            .render_page("# Title\n\n[[aside\n**note**\naside]]\n\nBody *text*.\n")
            .unwrap();
        assert!(html.contains("<h1>Title</h1>"), "got: {html}");
        assert!(
            html.contains("<aside><p><strong>note</strong></p>\n</aside>"),
            "got: {html}"
        );
        assert!(html.contains("<p>Body <em>text</em>.</p>"), "got: {html}");
    }

    #[test]
    fn test_render_page_aside_with_blank_line() {
        let pipeline = Pipeline::default();
        let html = pipeline
            .render_page("[[aside\n```\nx\n\ny\n```\naside]]\n")
            .unwrap();
        assert_eq!(html, "<aside><pre><code>x\n\ny\n</code></pre>\n</aside>\n");
    }

    #[test]
    fn test_render_page_aside_between_paragraphs() {
        let pipeline = Pipeline::default();
        let html = pipeline
            .render_page("Before\n[[aside\nOne\n\nTwo\naside]]\nAfter\n")
            .unwrap();
        assert_eq!(
            html,
            "<p>Before</p>\n<aside><p>One</p>\n<p>Two</p>\n</aside>\n<p>After</p>\n"
        );
    }

    #[test]
    fn test_preprocess_output_unchanged_by_page_protection() {
        let pipeline = Pipeline::default();
        let out = pipeline.preprocess("[[aside\nOne\n\nTwo\naside]]\n").unwrap();
        assert_eq!(out, "<aside><p>One</p>\n<p>Two</p>\n</aside>\n");
    }

    #[test]
    fn test_html_stash_round_trip() {
        let mut stash = HtmlStash::default();
        let first = stash.protect("<aside>a</aside>".to_string());
        let second = stash.protect("<aside>b</aside>".to_string());
        assert_ne!(first, second);
        assert_eq!(stash.len(), 2);
        let restored = stash.restore(format!("{first}\n<p>x</p>\n{second}\n"));
        assert_eq!(restored, "<aside>a</aside>\n<p>x</p>\n<aside>b</aside>\n");
    }

    #[test]
    fn test_steps_run_in_registration_order() {
        let mut pipeline = Pipeline::new(MarkdownOptions::commonmark());
        pipeline.register(Shout).register(AsideBlocks::new(
            |text: &str| -> Result<String> { Ok(text.trim().to_string()) },
        ));
        let out = pipeline.preprocess("[[aside\nhello\naside]]").unwrap();
        assert_eq!(out, "<aside>HELLO</aside>");
        assert_eq!(pipeline.step_names(), vec!["shout", "aside_blocks"]);
    }

    #[test]
    fn test_failing_step_aborts() {
        let mut pipeline = Pipeline::default();
        pipeline.register(Broken);
        let err = pipeline.render_page("text\n").unwrap_err();
        assert!(err.is_render());
    }

    #[test]
    fn test_pipeline_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_pipeline_shared_across_threads() {
        let pipeline = Arc::new(Pipeline::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pipeline = Arc::clone(&pipeline);
                std::thread::spawn(move || {
                    pipeline.render_page(&format!("[[aside\nnote {i}\naside]]\n"))
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let html = handle.join().unwrap().unwrap();
            assert!(html.contains(&format!("<aside><p>note {i}</p>")), "got: {html}");
        }
    }
}
