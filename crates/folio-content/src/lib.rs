//! Markdown rendering, aside-block preprocessing, and template helpers.
//!
//! # Features
//!
//! - [`MarkdownOptions`]: the site's Markdown dialect, built once and shared
//! - [`MarkdownRenderer`]: pulldown-cmark rendering with those options
//! - [`aside_blocks`]: `[[aside` … `aside]]` blocks rendered and wrapped in
//!   `<aside>` before the page render
//! - [`Pipeline`]: the per-page hook (preprocess, then render)
//! - [`HelperRegistry`]: named template helpers (`format_date`, `articles`)

#![doc = include_str!("../README.md")]

pub mod aside;
pub mod helpers;
pub mod options;
pub mod pipeline;
pub mod render;

pub use aside::{AsideBlock, AsideBlocks, aside_blocks, find_aside_blocks};
pub use helpers::{HelperRegistry, articles, format_date};
pub use options::MarkdownOptions;
pub use pipeline::{HtmlStash, Pipeline, Preprocessor};
pub use render::{MarkdownRenderer, Render, render_markdown};
