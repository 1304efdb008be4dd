//! Image sub-renderer
//!
//! Resolves an image source to a local file and hands it to the injected
//! [`ImageBackend`]. Every failure degrades to a hyperlink; this never errors.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use ratatui::style::{Color, Modifier};

use super::inline::IMAGE_ICON;
use crate::config::RenderConfig;
use crate::view::image::{ImageBackend, ImageView};
use crate::view::renderable::Renderable;
use crate::view::style::Style;
use crate::view::text::StyledText;

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

/// Maps an image source (path or URL) to a local file
pub trait ImageResolver: Send + Sync {
    fn resolve(&self, source: &str, base_dir: Option<&Path>) -> Option<PathBuf>;
}

/// Resolves absolute paths, `file://` URLs and paths relative to the document
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalImageResolver;

impl ImageResolver for LocalImageResolver {
    fn resolve(&self, source: &str, base_dir: Option<&Path>) -> Option<PathBuf> {
        if source.contains("://") && !source.starts_with("file://") {
            return None;
        }
        if source.starts_with("data:") {
            return None;
        }
        let path = Path::new(source.trim_start_matches("file://"));
        let path = match base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        path.is_file().then_some(path)
    }
}

/// Whether `source` names a raster format a backend can plausibly draw
pub fn is_likely_supported(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    if lower.starts_with("data:image/") {
        return true;
    }
    let path = lower.split(['?', '#']).next().unwrap_or("");
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// The `🖼️ Image: alt` hyperlink shown instead of an image
pub fn fallback_text(alt: &str, source: &str) -> StyledText {
    let style = Style::new()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED)
        .link(source);
    StyledText::styled(format!("{} Image: {}", IMAGE_ICON, alt), style)
}

#[derive(Clone)]
pub struct ImageRenderer {
    resolver: Arc<dyn ImageResolver>,
    backend: Option<Arc<dyn ImageBackend>>,
    base_dir: Option<PathBuf>,
    timeout: Duration,
    max_width: u16,
    max_height: u16,
}

impl ImageRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            resolver: Arc::new(LocalImageResolver),
            backend: None,
            base_dir: None,
            timeout: config.image_timeout(),
            max_width: config.image_max_width,
            max_height: config.image_max_height,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ImageResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_backend(mut self, backend: Option<Arc<dyn ImageBackend>>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Render an image, or its fallback link
    pub fn render(
        &self,
        alt: &str,
        source: &str,
        width: Option<u16>,
        height: Option<u16>,
    ) -> Renderable {
        let fallback = fallback_text(alt, source);
        if !is_likely_supported(source) {
            tracing::debug!("Unsupported image format: {}", source);
            return Renderable::Text(fallback);
        }
        let Some(path) = self.resolve(source) else {
            return Renderable::Text(fallback);
        };
        let non_empty = std::fs::metadata(&path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !non_empty {
            tracing::debug!("Image file missing or empty: {}", path.display());
            return Renderable::Text(fallback);
        }
        let Some(backend) = &self.backend else {
            return Renderable::Text(fallback);
        };

        Renderable::Image(ImageView::new(
            alt,
            path,
            width.unwrap_or(self.max_width).min(self.max_width),
            height.unwrap_or(self.max_height).min(self.max_height),
            Arc::clone(backend),
            fallback,
        ))
    }

    /// Run the resolver on a worker thread, giving up after the timeout
    fn resolve(&self, source: &str) -> Option<PathBuf> {
        let (tx, rx) = mpsc::channel();
        let resolver = Arc::clone(&self.resolver);
        let source_owned = source.to_string();
        let base_dir = self.base_dir.clone();
        let spawned = std::thread::Builder::new()
            .name("image-resolve".to_string())
            .spawn(move || {
                let _ = tx.send(resolver.resolve(&source_owned, base_dir.as_deref()));
            });
        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn image resolver: {}", e);
            return None;
        }

        match rx.recv_timeout(self.timeout) {
            Ok(path) => path,
            Err(_) => {
                tracing::warn!(
                    "Image resolution timed out after {:?}: {}",
                    self.timeout,
                    source
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for ImageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRenderer")
            .field("base_dir", &self.base_dir)
            .field("timeout", &self.timeout)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}
