//! Image renderables drawn by an injected backend
//!
//! The crate has no image decoder of its own. Callers that can draw images
//! (sixel, kitty, half-block...) pass an [`ImageBackend`]; without one,
//! images fall back to a hyperlink.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::style::SegmentLine;
use super::text::StyledText;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image backend failed: {0}")]
    Backend(String),
}

/// Draws a local image file as terminal rows
pub trait ImageBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Render `path` into at most `max_width` x `max_height` cells
    fn render(
        &self,
        path: &Path,
        max_width: u16,
        max_height: u16,
    ) -> Result<Vec<SegmentLine>, ImageError>;
}

/// An image placed in a document
#[derive(Clone)]
pub struct ImageView {
    pub alt: String,
    pub path: PathBuf,
    pub max_width: u16,
    pub max_height: u16,
    backend: Arc<dyn ImageBackend>,
    fallback: StyledText,
}

impl ImageView {
    pub fn new(
        alt: impl Into<String>,
        path: PathBuf,
        max_width: u16,
        max_height: u16,
        backend: Arc<dyn ImageBackend>,
        fallback: StyledText,
    ) -> Self {
        Self {
            alt: alt.into(),
            path,
            max_width,
            max_height,
            backend,
            fallback,
        }
    }

    pub fn try_render(&self, width: usize) -> Result<Vec<SegmentLine>, ImageError> {
        let width = u16::try_from(width).unwrap_or(u16::MAX).min(self.max_width);
        self.backend.render(&self.path, width, self.max_height)
    }

    /// Text shown when the backend cannot draw the image
    pub fn fallback(&self) -> &StyledText {
        &self.fallback
    }
}

impl fmt::Debug for ImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageView")
            .field("alt", &self.alt)
            .field("path", &self.path)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl PartialEq for ImageView {
    fn eq(&self, other: &Self) -> bool {
        self.alt == other.alt
            && self.path == other.path
            && self.max_width == other.max_width
            && self.max_height == other.max_height
            && Arc::ptr_eq(&self.backend, &other.backend)
    }
}
