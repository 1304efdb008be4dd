//! Low-level primitives
//!
//! Grammar/theme loading and caching, line tokenization and scope-to-style
//! resolution. All of these are pure Rust on top of syntect.

pub mod cache;
pub mod grammar_registry;
pub mod styler;
pub mod syntect_highlighter;
