//! Markdown dialect configuration.
//!
//! [`MarkdownOptions`] is the single Renderer Configuration for a site. It is
//! built once at startup (from defaults or the `[markdown]` config section)
//! and shared read-only by every render call.

use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

/// Named Markdown dialect toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Fenced (```` ``` ```` / `~~~`) code blocks produce code blocks.
    pub fenced_code_blocks: bool,

    /// Smart quotes, dashes and ellipses.
    pub smartypants: bool,

    /// Emphasis delimiters inside a word stay literal (`snake*case*name`).
    pub no_intra_emphasis: bool,

    /// Bare URLs in text become links.
    pub autolink: bool,

    /// Indentation alone does not start a code block.
    pub disable_indented_code_blocks: bool,

    /// GFM tables.
    pub tables: bool,

    /// `~~strikethrough~~`.
    pub strikethrough: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            fenced_code_blocks: true,
            smartypants: true,
            no_intra_emphasis: true,
            autolink: true,
            disable_indented_code_blocks: true,
            tables: false,
            strikethrough: false,
        }
    }
}

impl MarkdownOptions {
    /// Plain CommonMark: every extension and override off.
    ///
    /// Fenced and indented code blocks both behave as CommonMark specifies.
    pub fn commonmark() -> Self {
        Self {
            fenced_code_blocks: true,
            smartypants: false,
            no_intra_emphasis: false,
            autolink: false,
            disable_indented_code_blocks: false,
            tables: false,
            strikethrough: false,
        }
    }

    /// The parser-level option bits.
    ///
    /// Options the parser cannot express (code block kinds, intra-word
    /// emphasis, autolinks) are applied to the event stream by the renderer.
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.smartypants {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        options
    }

    /// Whether the renderer has to rewrite the event stream at all.
    pub(crate) fn needs_event_pass(&self) -> bool {
        !self.fenced_code_blocks
            || self.disable_indented_code_blocks
            || self.no_intra_emphasis
            || self.autolink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_site_dialect() {
        let opts = MarkdownOptions::default();
        assert!(opts.fenced_code_blocks);
        assert!(opts.smartypants);
        assert!(opts.no_intra_emphasis);
        assert!(opts.autolink);
        assert!(opts.disable_indented_code_blocks);
        assert!(!opts.tables);
        assert!(!opts.strikethrough);
    }

    #[test]
    fn test_parser_options_default() {
        let bits = MarkdownOptions::default().parser_options();
        assert!(bits.contains(Options::ENABLE_SMART_PUNCTUATION));
        assert!(!bits.contains(Options::ENABLE_TABLES));
        assert!(!bits.contains(Options::ENABLE_STRIKETHROUGH));
    }

    #[test]
    fn test_parser_options_commonmark() {
        let opts = MarkdownOptions::commonmark();
        assert!(opts.parser_options().is_empty());
        assert!(!opts.needs_event_pass());
    }

    #[test]
    fn test_parser_options_extensions() {
        let opts = MarkdownOptions {
            tables: true,
            strikethrough: true,
            ..MarkdownOptions::commonmark()
        };
        let bits = opts.parser_options();
        assert!(bits.contains(Options::ENABLE_TABLES));
        assert!(bits.contains(Options::ENABLE_STRIKETHROUGH));
    }

    #[test]
    fn test_options_from_partial_toml_keys() {
        let json = r#"{"smartypants": false, "tables": true}"#;
        let opts: MarkdownOptions = serde_json::from_str(json).unwrap();
        assert!(!opts.smartypants);
        assert!(opts.tables);
        // Unspecified keys keep the site defaults.
        assert!(opts.autolink);
        assert!(opts.disable_indented_code_blocks);
    }
}
