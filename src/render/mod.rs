//! Renderers that turn source text into renderables

pub mod line_renderer;

pub use line_renderer::LineRenderer;
