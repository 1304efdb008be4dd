//! View layer
//!
//! Renderables, styled text, layout widgets (panel, table) and the result
//! container. Everything here is pure layout over `ratatui` style types;
//! terminal output (ANSI writer) is marked with #[cfg(feature = "runtime")].

pub mod highlighted_text;
pub mod image;
pub mod panel;
pub mod renderable;
pub mod style;
pub mod table;
pub mod text;

// Runtime-only output (crossterm)
#[cfg(feature = "runtime")]
pub mod ansi;
