//! Markdown → HTML rendering.
//!
//! Uses pulldown-cmark for parsing. The parser handles smart punctuation,
//! tables and strikethrough natively; the rest of [`MarkdownOptions`] is
//! applied by walking the event stream before it reaches the HTML writer:
//!
//! - disabled fenced blocks are re-emitted as a paragraph of literal text
//! - disabled indented blocks are parsed again as ordinary Markdown
//! - intra-word emphasis is turned back into its delimiter characters
//! - bare URLs in plain text become links

use std::sync::{Arc, LazyLock};

use folio_core::Result;
use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, LinkType, Parser, Tag, TagEnd, html::push_html,
};
use regex::Regex;

use crate::options::MarkdownOptions;

/// Anything that turns Markdown text into HTML.
///
/// This is the seam the aside preprocessor and host pipelines render
/// through. Closures with the right signature implement it, so tests and
/// hosts can inject their own renderer.
pub trait Render: Send + Sync {
    /// Render `text` to HTML.
    fn render(&self, text: &str) -> Result<String>;
}

impl<F> Render for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn render(&self, text: &str) -> Result<String> {
        self(text)
    }
}

/// The site Markdown renderer.
///
/// Holds the shared, immutable [`MarkdownOptions`]. Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: Arc<MarkdownOptions>,
}

impl MarkdownRenderer {
    /// Create a renderer that owns its options.
    pub fn new(options: MarkdownOptions) -> Self {
        Self::from_shared(Arc::new(options))
    }

    /// Create a renderer over options shared with other components.
    pub fn from_shared(options: Arc<MarkdownOptions>) -> Self {
        Self { options }
    }

    /// The options every render call applies.
    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Render Markdown to an HTML string.
    pub fn to_html(&self, text: &str) -> String {
        render_markdown(text, &self.options)
    }
}

impl Render for MarkdownRenderer {
    fn render(&self, text: &str) -> Result<String> {
        Ok(self.to_html(text))
    }
}

/// Render Markdown to HTML with the given options.
pub fn render_markdown(text: &str, options: &MarkdownOptions) -> String {
    let parser = Parser::new_ext(text, options.parser_options());
    let mut html = String::with_capacity(text.len() * 3 / 2);

    if options.needs_event_pass() {
        let events = apply_dialect(text, parser, options);
        push_html(&mut html, events.into_iter());
    } else {
        push_html(&mut html, parser);
    }
    html
}

// ─── Event pass ──────────────────────────────────────────────────────────────

/// A code block whose kind is disabled, collected until its end event.
struct DemotedBlock {
    text: String,
    /// Fenced blocks keep their source verbatim, fences included. Indented
    /// blocks hold their content with the code indent removed.
    verbatim: bool,
}

fn apply_dialect<'a>(
    source: &'a str,
    parser: Parser<'a>,
    options: &MarkdownOptions,
) -> Vec<Event<'a>> {
    let mut events: Vec<Event<'a>> = Vec::new();
    let mut demoted: Option<DemotedBlock> = None;
    let mut in_code_block = false;
    // One entry per open emphasis/strong span: the literal closing delimiter
    // when the span was turned back into text.
    let mut emphasis: Vec<Option<&'a str>> = Vec::new();
    // Links, images and raw `<a>` tags; no autolinking inside them.
    let mut link_depth = 0usize;

    // Adjacent text events, merged so URLs split by the parser link whole.
    let mut pending = String::new();

    for (event, range) in parser.into_offset_iter() {
        let autolinkable = options.autolink
            && link_depth == 0
            && !in_code_block
            && demoted.is_none()
            && matches!(event, Event::Text(_));
        if !autolinkable && !pending.is_empty() {
            push_autolinked(&mut events, &std::mem::take(&mut pending));
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let disabled = match &kind {
                    CodeBlockKind::Indented => options.disable_indented_code_blocks,
                    CodeBlockKind::Fenced(_) => !options.fenced_code_blocks,
                };
                if disabled {
                    let verbatim = matches!(kind, CodeBlockKind::Fenced(_));
                    let text = if verbatim {
                        source.get(range).unwrap_or_default().to_string()
                    } else {
                        String::new()
                    };
                    demoted = Some(DemotedBlock { text, verbatim });
                } else {
                    in_code_block = true;
                    events.push(Event::Start(Tag::CodeBlock(kind)));
                }
            }
            Event::End(TagEnd::CodeBlock) => match demoted.take() {
                Some(block) if block.verbatim => push_paragraph(&mut events, &block.text),
                Some(block) => push_reparsed(&mut events, &block.text, options),
                None => {
                    in_code_block = false;
                    events.push(Event::End(TagEnd::CodeBlock));
                }
            },
            Event::Text(text) if demoted.is_some() => {
                if let Some(block) = demoted.as_mut()
                    && !block.verbatim
                {
                    block.text.push_str(&text);
                }
            }
            _ if demoted.is_some() => {}

            Event::Start(tag @ (Tag::Emphasis | Tag::Strong)) => {
                let width = if matches!(tag, Tag::Strong) { 2 } else { 1 };
                let literal = if options.no_intra_emphasis && is_intra_word(source, &range) {
                    delimiters(source, &range, width)
                } else {
                    None
                };
                match literal {
                    Some((open, close)) => {
                        events.push(Event::Text(CowStr::Borrowed(open)));
                        emphasis.push(Some(close));
                    }
                    None => {
                        events.push(Event::Start(tag));
                        emphasis.push(None);
                    }
                }
            }
            Event::End(end @ (TagEnd::Emphasis | TagEnd::Strong)) => match emphasis.pop() {
                Some(Some(close)) => events.push(Event::Text(CowStr::Borrowed(close))),
                _ => events.push(Event::End(end)),
            },

            Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                link_depth += 1;
                events.push(Event::Start(tag));
            }
            Event::End(end @ (TagEnd::Link | TagEnd::Image)) => {
                link_depth = link_depth.saturating_sub(1);
                events.push(Event::End(end));
            }
            Event::InlineHtml(html) => {
                if opens_anchor(&html) {
                    link_depth += 1;
                } else if html.starts_with("</a") {
                    link_depth = link_depth.saturating_sub(1);
                }
                events.push(Event::InlineHtml(html));
            }

            Event::Text(text) if autolinkable => pending.push_str(&text),

            other => events.push(other),
        }
    }
    if !pending.is_empty() {
        push_autolinked(&mut events, &pending);
    }

    events
}

/// Parse dedented block content as Markdown and splice in its events.
///
/// Content indented by a further four columns comes back as another
/// indented block and is demoted again, one level per pass.
fn push_reparsed<'e>(events: &mut Vec<Event<'e>>, text: &str, options: &MarkdownOptions) {
    let parser = Parser::new_ext(text, options.parser_options());
    events.extend(
        apply_dialect(text, parser, options)
            .into_iter()
            .map(|event| -> Event<'e> { event.into_static() }),
    );
}

/// Emit literal text as a paragraph, one soft break per source line.
fn push_paragraph(events: &mut Vec<Event<'_>>, text: &str) {
    let text = text.trim_end_matches(['\n', '\r']);
    if text.trim().is_empty() {
        return;
    }
    events.push(Event::Start(Tag::Paragraph));
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            events.push(Event::SoftBreak);
        }
        events.push(Event::Text(CowStr::from(line.trim().to_string())));
    }
    events.push(Event::End(TagEnd::Paragraph));
}

/// An emphasis span is intra-word when a letter or digit touches either
/// of its outer delimiters.
fn is_intra_word(source: &str, range: &std::ops::Range<usize>) -> bool {
    let before = source
        .get(..range.start)
        .and_then(|s| s.chars().next_back());
    let after = source.get(range.end..).and_then(|s| s.chars().next());
    before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric)
}

fn delimiters<'a>(
    source: &'a str,
    range: &std::ops::Range<usize>,
    width: usize,
) -> Option<(&'a str, &'a str)> {
    if range.end < range.start + 2 * width {
        return None;
    }
    let open = source.get(range.start..range.start + width)?;
    let close = source.get(range.end - width..range.end)?;
    Some((open, close))
}

fn opens_anchor(html: &str) -> bool {
    html.starts_with("<a ") || html.starts_with("<a>") || html.starts_with("<a\n")
}

// ─── Autolinks ───────────────────────────────────────────────────────────────

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>]+").expect("autolink pattern is valid")
});

fn push_autolinked(events: &mut Vec<Event<'_>>, text: &str) {
    let mut last = 0;

    for m in URL_RE.find_iter(text) {
        let url = trim_url(m.as_str());
        if !url.contains('.') {
            continue;
        }
        if m.start() > last {
            events.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        let dest = if url.to_ascii_lowercase().starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(dest),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::from(url.to_string())));
        events.push(Event::End(TagEnd::Link));
        last = m.start() + url.len();
    }

    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Drop trailing sentence punctuation and unbalanced closing parens.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ':', ';', '!', '?', '"', '\'']);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(inner) if trimmed.matches('(').count() < trimmed.matches(')').count() => inner,
            _ => trimmed,
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}
