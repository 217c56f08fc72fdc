//! Aside blocks.
//!
//! An aside is a run of lines fenced by a `[[aside` line and an `aside]]`
//! line:
//!
//! ```text
//! Regular paragraph.
//! [[aside
//! Some *nested* Markdown.
//! aside]]
//! ```
//!
//! Before the page itself is rendered, each aside's inner text is rendered
//! on its own and the whole block, markers included, is replaced by
//! `<aside>…</aside>`. Everything outside matched blocks passes through
//! byte for byte. A `[[aside` with no closing line is left alone.

use std::ops::Range;
use std::sync::LazyLock;

use folio_core::Result;
use regex::Regex;

use crate::pipeline::{HtmlStash, Preprocessor};
use crate::render::Render;

/// Line that opens an aside block.
pub const START_MARKER: &str = "[[aside";

/// Line that closes an aside block.
pub const END_MARKER: &str = "aside]]";

// Non-greedy: a block closes at the first `aside]]` line after its start.
// `$` is end of line, so the end marker need not be the last line.
static ASIDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\[\[aside\n((?s:.)*?)^aside\]\]$").expect("aside pattern is valid")
});

static START_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[\[aside$").expect("start marker pattern is valid"));

/// A matched aside block within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsideBlock<'a> {
    /// Byte span of the whole block, markers included.
    pub span: Range<usize>,
    /// 1-based line number of the start marker.
    pub line: usize,
    /// Text strictly between the marker lines.
    pub inner: &'a str,
}

/// Find every well-formed aside block, in document order.
pub fn find_aside_blocks(document: &str) -> Vec<AsideBlock<'_>> {
    ASIDE_RE
        .captures_iter(document)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some(AsideBlock {
                span: whole.range(),
                line: line_of(document, whole.start()),
                inner: inner.as_str(),
            })
        })
        .collect()
}

/// Line numbers of `[[aside` markers that never close.
///
/// Markers inside a matched block's inner text are part of that block and
/// are not reported.
pub fn unterminated_markers(document: &str) -> Vec<usize> {
    let blocks = find_aside_blocks(document);
    START_LINE_RE
        .find_iter(document)
        .map(|m| m.start())
        .filter(|pos| !blocks.iter().any(|b| b.span.contains(pos)))
        .map(|pos| line_of(document, pos))
        .collect()
}

fn line_of(document: &str, offset: usize) -> usize {
    document[..offset].matches('\n').count() + 1
}

/// Replace every aside block in `document` with its rendered inner text.
///
/// `renderer` is called once per block, in document order. The first
/// render failure aborts the whole call.
pub fn aside_blocks<R: Render + ?Sized>(document: &str, renderer: &R) -> Result<String> {
    substitute(document, renderer, |html| html)
}

/// Shared substitution loop. `place` decides what text stands in for each
/// wrapped `<aside>` element in the output.
fn substitute<R, F>(document: &str, renderer: &R, mut place: F) -> Result<String>
where
    R: Render + ?Sized,
    F: FnMut(String) -> String,
{
    let mut output = String::with_capacity(document.len());
    let mut last = 0;
    let mut count = 0usize;

    for caps in ASIDE_RE.captures_iter(document) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        output.push_str(&document[last..whole.start()]);
        let rendered = renderer.render(inner.as_str())?;
        output.push_str(&place(format!("<aside>{rendered}</aside>")));
        last = whole.end();
        count += 1;
    }
    output.push_str(&document[last..]);

    if count > 0 {
        log::debug!("rendered {count} aside block(s)");
    }
    Ok(output)
}

/// The aside transform as a pipeline step.
#[derive(Debug, Clone)]
pub struct AsideBlocks<R> {
    renderer: R,
}

impl<R: Render> AsideBlocks<R> {
    /// Render aside bodies with `renderer`.
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }
}

impl<R: Render> Preprocessor for AsideBlocks<R> {
    fn name(&self) -> &str {
        "aside_blocks"
    }

    fn preprocess(&self, document: &str) -> Result<String> {
        aside_blocks(document, &self.renderer)
    }

    // Each block fills whole lines, so its placeholder does too.
    fn preprocess_page(&self, document: &str, stash: &mut HtmlStash) -> Result<String> {
        substitute(document, &self.renderer, |html| stash.protect(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Error;
    use proptest::prelude::*;
    use std::sync::Mutex;

    /// Renderer that records its inputs and tags its output.
    fn recording(calls: &Mutex<Vec<String>>) -> impl Fn(&str) -> Result<String> + Send + Sync + '_ {
        move |text: &str| {
            calls.lock().unwrap().push(text.to_string());
            Ok(format!("[{}]", text.trim_end()))
        }
    }

    fn strong(text: &str) -> Result<String> {
        Ok(format!(
            "<strong>{}</strong>\n",
            text.trim_end().trim_matches('*')
        ))
    }

    // ------------------------------------------------------------------------
    // Matching and substitution
    // ------------------------------------------------------------------------

    #[test]
    fn test_single_block() {
        let doc = "Hello\n[[aside\n**world**\naside]]\nBye";
        let out = aside_blocks(doc, &strong).unwrap();
        assert_eq!(out, "Hello\n<aside><strong>world</strong>\n</aside>\nBye");
    }

    #[test]
    fn test_single_block_render_called_once_with_inner() {
        let calls = Mutex::new(Vec::new());
        let doc = "Hello\n[[aside\n**world**\naside]]\nBye";
        aside_blocks(doc, &recording(&calls)).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["**world**\n".to_string()]);
    }

    #[test]
    fn test_unterminated_block_unchanged() {
        let calls = Mutex::new(Vec::new());
        let doc = "[[aside\nfoo";
        assert_eq!(aside_blocks(doc, &recording(&calls)).unwrap(), doc);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_markers_unchanged() {
        let doc = "# Title\n\nJust [a link](x) and [[wiki]] text.\n";
        assert_eq!(aside_blocks(doc, &strong).unwrap(), doc);
    }

    #[test]
    fn test_multiple_blocks_in_order() {
        let calls = Mutex::new(Vec::new());
        let doc = "a\n[[aside\none\naside]]\nb\n[[aside\ntwo\naside]]\nc\n";
        let out = aside_blocks(doc, &recording(&calls)).unwrap();
        assert_eq!(out, "a\n<aside>[one]</aside>\nb\n<aside>[two]</aside>\nc\n");
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["one\n".to_string(), "two\n".to_string()]
        );
    }

    #[test]
    fn test_non_greedy_match() {
        // The first block ends at the first end marker, not the last.
        let doc = "[[aside\nx\naside]]\nmiddle\naside]]\n";
        let out = aside_blocks(doc, &recording(&Mutex::new(Vec::new()))).unwrap();
        assert_eq!(out, "<aside>[x]</aside>\nmiddle\naside]]\n");
    }

    #[test]
    fn test_multiline_inner() {
        let calls = Mutex::new(Vec::new());
        let doc = "[[aside\n# Heading\n\n- item\n- item\naside]]";
        aside_blocks(doc, &recording(&calls)).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["# Heading\n\n- item\n- item\n".to_string()]
        );
    }

    #[test]
    fn test_empty_inner() {
        let calls = Mutex::new(Vec::new());
        let out = aside_blocks("[[aside\naside]]\n", &recording(&calls)).unwrap();
        assert_eq!(out, "<aside>[]</aside>\n");
        assert_eq!(*calls.lock().unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_markers_must_fill_their_line() {
        let doc = "x [[aside\nfoo\naside]]\n[[aside\nbar\naside]] y\n";
        assert_eq!(aside_blocks(doc, &strong).unwrap(), doc);
    }

    #[test]
    fn test_end_marker_need_not_end_document() {
        let doc = "[[aside\nfoo\naside]]\n\nMore text.\n";
        let out = aside_blocks(doc, &recording(&Mutex::new(Vec::new()))).unwrap();
        assert_eq!(out, "<aside>[foo]</aside>\n\nMore text.\n");
    }

    #[test]
    fn test_nested_start_marker_is_inner_text() {
        let calls = Mutex::new(Vec::new());
        let doc = "[[aside\nouter\n[[aside\ninner\naside]]\ntail\naside]]\n";
        let out = aside_blocks(doc, &recording(&calls)).unwrap();
        assert_eq!(out, "<aside>[outer\n[[aside\ninner]</aside>\ntail\naside]]\n");
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_render_failure_propagates() {
        let failing = |text: &str| -> Result<String> {
            if text.contains("bad") {
                Err(Error::render("cannot render"))
            } else {
                Ok(String::new())
            }
        };
        let doc = "[[aside\ngood\naside]]\n[[aside\nbad\naside]]\n";
        let err = aside_blocks(doc, &failing).unwrap_err();
        assert!(err.is_render());
    }

    #[test]
    fn test_with_markdown_renderer() {
        let renderer = crate::render::MarkdownRenderer::default();
        let doc = "Hello\n[[aside\n**world**\naside]]\nBye";
        let out = aside_blocks(doc, &renderer).unwrap();
        assert_eq!(
            out,
            "Hello\n<aside><p><strong>world</strong></p>\n</aside>\nBye"
        );
    }

    #[test]
    fn test_preprocessor_impl() {
        let step = AsideBlocks::new(strong);
        assert_eq!(step.name(), "aside_blocks");
        let out = step.preprocess("[[aside\n*hi*\naside]]").unwrap();
        assert_eq!(out, "<aside><strong>hi</strong>\n</aside>");
    }

    #[test]
    fn test_preprocess_page_stashes_blocks() {
        let step = AsideBlocks::new(strong);
        let mut stash = HtmlStash::default();
        let out = step
            .preprocess_page("a\n[[aside\n*hi*\naside]]\nb\n", &mut stash)
            .unwrap();
        assert_eq!(stash.len(), 1);
        assert!(!out.contains("<aside>"), "got: {out}");
        assert_eq!(
            stash.restore(out),
            "a\n<aside><strong>hi</strong>\n</aside>\nb\n"
        );
    }

    // ------------------------------------------------------------------------
    // Block discovery
    // ------------------------------------------------------------------------

    #[test]
    fn test_find_aside_blocks() {
        let doc = "intro\n\n[[aside\nnote\naside]]\n";
        let blocks = find_aside_blocks(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line, 3);
        assert_eq!(blocks[0].inner, "note\n");
        assert_eq!(&doc[blocks[0].span.clone()], "[[aside\nnote\naside]]");
    }

    #[test]
    fn test_unterminated_markers() {
        let doc = "[[aside\nok\naside]]\n\n[[aside\nnever closed\n";
        assert_eq!(unterminated_markers(doc), vec![5]);
    }

    #[test]
    fn test_unterminated_markers_ignores_nested() {
        let doc = "[[aside\n[[aside\nx\naside]]\n";
        assert!(unterminated_markers(doc).is_empty());
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_documents_without_markers_pass_through(doc in "[a-z #*_\\-\\n]{0,200}") {
            let out = aside_blocks(&doc, &strong).unwrap();
            prop_assert_eq!(out, doc);
        }

        #[test]
        fn prop_each_block_rendered_once_in_order(
            parts in proptest::collection::vec(("[a-z \\n]{0,12}", "[a-z ]{0,12}"), 0..6),
            tail in "[a-z \\n]{0,12}",
        ) {
            let mut doc = String::new();
            let mut expected = String::new();
            for (before, inner) in &parts {
                doc.push_str(&format!("{before}\n[[aside\n{inner}\naside]]\n"));
                expected.push_str(&format!("{before}\n<aside>[{}]</aside>\n", inner.trim_end()));
            }
            doc.push_str(&tail);
            expected.push_str(&tail);

            let calls = Mutex::new(Vec::new());
            let out = aside_blocks(&doc, &recording(&calls)).unwrap();
            prop_assert_eq!(out, expected);

            let inners: Vec<String> = parts.iter().map(|(_, inner)| format!("{inner}\n")).collect();
            prop_assert_eq!(calls.into_inner().unwrap(), inners);
        }
    }
}
