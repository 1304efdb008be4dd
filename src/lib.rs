// Library for syntax-highlighted terminal rendering of source lines and
// markdown documents

// Core types and config are always available
pub mod config;
pub mod error;

// Rendering core (pure layout, no terminal access)
pub mod markdown;
pub mod primitives;
pub mod processor;
pub mod render;
pub mod view;

// Runtime-only modules (require the "runtime" feature)
#[cfg(feature = "runtime")]
pub mod pager;

pub use config::RenderConfig;
pub use error::{RenderError, Result};
pub use primitives::grammar_registry::{ThemeId, ThemeName};
pub use processor::{CancellationToken, RenderBatch, TextMateProcessor};
pub use view::highlighted_text::HighlightedText;
pub use view::renderable::Renderable;
