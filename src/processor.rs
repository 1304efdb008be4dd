//! Rendering entry points
//!
//! [`TextMateProcessor`] ties the shared caches, the configuration and the
//! image services together. Every entry point resolves the theme and grammar
//! first, so lookup errors surface before any output is produced.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::markdown::image::{ImageRenderer, ImageResolver, LocalImageResolver};
use crate::markdown::{DocumentRenderer, MarkdownContext};
use crate::primitives::cache::TextMateCache;
use crate::primitives::grammar_registry::{Grammar, LoadedTheme, ThemeId};
use crate::primitives::styler::TokenStyler;
use crate::primitives::syntect_highlighter::LexerState;
use crate::render::LineRenderer;
use crate::view::highlighted_text::HighlightedText;
use crate::view::image::ImageBackend;
use crate::view::renderable::Renderable;

/// Cooperative cancellation flag shared with a running batch iterator
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reported after each emitted batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch_index: usize,
    pub lines_processed: usize,
}

pub type ProgressCallback<'a> = Box<dyn FnMut(BatchProgress) + 'a>;

/// A run of consecutive rendered lines
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBatch {
    pub renderables: Vec<Renderable>,
    pub batch_index: usize,
    /// Index of the first line of this batch in the whole input
    pub file_offset: usize,
}

impl RenderBatch {
    /// A container numbered from this batch's position in the input
    pub fn into_container(self) -> HighlightedText {
        let mut container = HighlightedText::new(self.renderables);
        container.line_number_start = self.file_offset + 1;
        container
    }
}

pub struct TextMateProcessor {
    cache: Arc<TextMateCache>,
    styler: Arc<TokenStyler>,
    config: RenderConfig,
    image_resolver: Arc<dyn ImageResolver>,
    image_backend: Option<Arc<dyn ImageBackend>>,
    base_dir: Option<PathBuf>,
}

impl Default for TextMateProcessor {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl TextMateProcessor {
    /// A processor over the process-wide caches
    pub fn new(config: RenderConfig) -> Self {
        Self {
            cache: TextMateCache::global(),
            styler: TokenStyler::global(),
            config,
            image_resolver: Arc::new(LocalImageResolver),
            image_backend: None,
            base_dir: None,
        }
    }

    /// Use private caches instead of the process-wide ones
    pub fn with_caches(mut self, cache: Arc<TextMateCache>, styler: Arc<TokenStyler>) -> Self {
        self.cache = cache;
        self.styler = styler;
        self
    }

    pub fn with_image_resolver(mut self, resolver: Arc<dyn ImageResolver>) -> Self {
        self.image_resolver = resolver;
        self
    }

    pub fn with_image_backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.image_backend = Some(backend);
        self
    }

    /// Directory that relative image paths in documents resolve against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TextMateCache> {
        &self.cache
    }

    fn resolve(
        &self,
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
    ) -> Result<(Arc<Grammar>, Arc<LoadedTheme>)> {
        let (registry, theme) = self.cache.get_theme(theme)?;
        let grammar = self
            .cache
            .get_grammar(&registry, grammar_id, is_extension)
            .ok_or_else(|| RenderError::grammar_not_found(grammar_id, is_extension))?;
        Ok((grammar, theme))
    }

    /// Highlight `lines`, one renderable per line
    ///
    /// Returns `Ok(None)` when every line is empty.
    pub fn render_lines<S: AsRef<str>>(
        &self,
        lines: &[S],
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
    ) -> Result<Option<HighlightedText>> {
        self.render_lines_with(lines, theme, grammar_id, is_extension, false)
    }

    /// Like [`render_lines`](Self::render_lines) but keeps control characters
    pub fn render_lines_raw<S: AsRef<str>>(
        &self,
        lines: &[S],
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
    ) -> Result<Option<HighlightedText>> {
        self.render_lines_with(lines, theme, grammar_id, is_extension, true)
    }

    fn render_lines_with<S: AsRef<str>>(
        &self,
        lines: &[S],
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
        raw: bool,
    ) -> Result<Option<HighlightedText>> {
        if lines.iter().all(|l| l.as_ref().is_empty()) {
            return Ok(None);
        }
        let (grammar, theme) = self.resolve(theme, grammar_id, is_extension)?;
        let renderables = LineRenderer::new(&grammar, &theme, &self.styler)
            .raw(raw)
            .render(lines)?;
        Ok(Some(
            HighlightedText::new(renderables).with_language(grammar.name()),
        ))
    }

    /// Stream `lines` in batches of `batch_size`
    ///
    /// Fails before consuming input when `batch_size` is zero or the theme or
    /// grammar cannot be resolved.
    pub fn render_lines_batched<'a, I>(
        &self,
        lines: I,
        batch_size: usize,
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
    ) -> Result<RenderBatches<'a>>
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: 'a,
    {
        self.batches(
            Box::new(lines.into_iter().map(Ok::<String, io::Error>)),
            batch_size,
            theme,
            grammar_id,
            is_extension,
        )
    }

    /// Stream a file line by line in batches
    pub fn render_file_batched(
        &self,
        path: impl AsRef<Path>,
        batch_size: usize,
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
    ) -> Result<RenderBatches<'static>> {
        if batch_size == 0 {
            return Err(zero_batch_size());
        }
        let reader = BufReader::new(File::open(path.as_ref())?);
        self.render_reader_batched(reader, batch_size, theme, grammar_id, is_extension)
    }

    /// Stream any buffered reader (stdin, a socket...) line by line in batches
    ///
    /// A read failure, including invalid UTF-8, ends the stream with
    /// [`RenderError::Io`].
    pub fn render_reader_batched<'a, R>(
        &self,
        reader: R,
        batch_size: usize,
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
    ) -> Result<RenderBatches<'a>>
    where
        R: BufRead + 'a,
    {
        self.batches(
            Box::new(reader.lines()),
            batch_size,
            theme,
            grammar_id,
            is_extension,
        )
    }

    fn batches<'a>(
        &self,
        lines: Box<dyn Iterator<Item = io::Result<String>> + 'a>,
        batch_size: usize,
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
    ) -> Result<RenderBatches<'a>> {
        if batch_size == 0 {
            return Err(zero_batch_size());
        }
        let (grammar, theme) = self.resolve(theme, grammar_id, is_extension)?;
        Ok(RenderBatches {
            lines,
            grammar,
            theme,
            styler: Arc::clone(&self.styler),
            batch_size,
            batch_index: 0,
            offset: 0,
            state: None,
            cancellation: None,
            progress: None,
            done: false,
        })
    }

    /// Render a markdown document block by block
    ///
    /// Returns `Ok(None)` when the document renders to nothing.
    pub fn render_document(&self, text: &str, theme: &ThemeId) -> Result<Option<HighlightedText>> {
        let (registry, theme) = self.cache.get_theme(theme)?;
        let images = ImageRenderer::new(&self.config)
            .with_resolver(Arc::clone(&self.image_resolver))
            .with_backend(self.image_backend.clone())
            .with_base_dir(self.base_dir.clone());
        let ctx = MarkdownContext {
            theme: &theme,
            styler: &self.styler,
            config: &self.config,
            cache: &self.cache,
            registry: &registry,
            images: &images,
        };
        let renderables = DocumentRenderer::new(ctx).render(text);
        if renderables.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            HighlightedText::new(renderables).with_language("markdown"),
        ))
    }

    /// Render markdown grammars as documents, everything else line by line
    pub fn render_auto<S: AsRef<str>>(
        &self,
        lines: &[S],
        theme: &ThemeId,
        grammar_id: &str,
        is_extension: bool,
        force_line_renderer: bool,
    ) -> Result<Option<HighlightedText>> {
        let (grammar, _) = self.resolve(theme, grammar_id, is_extension)?;
        if grammar.is_markdown() && !force_line_renderer {
            let text = lines
                .iter()
                .map(|l| l.as_ref())
                .collect::<Vec<_>>()
                .join("\n");
            return self.render_document(&text, theme);
        }
        self.render_lines(lines, theme, grammar_id, is_extension)
    }
}

fn zero_batch_size() -> RenderError {
    RenderError::InvalidArgument {
        name: "batch_size",
        reason: "must be greater than zero".to_string(),
    }
}

/// Pull-based batch iterator; lexer state carries across batches
pub struct RenderBatches<'a> {
    lines: Box<dyn Iterator<Item = io::Result<String>> + 'a>,
    grammar: Arc<Grammar>,
    theme: Arc<LoadedTheme>,
    styler: Arc<TokenStyler>,
    batch_size: usize,
    batch_index: usize,
    offset: usize,
    state: Option<LexerState>,
    cancellation: Option<CancellationToken>,
    progress: Option<ProgressCallback<'a>>,
    done: bool,
}

impl<'a> RenderBatches<'a> {
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(BatchProgress) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    fn cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn stop(&mut self) -> Option<Result<RenderBatch>> {
        self.done = true;
        None
    }
}

impl Iterator for RenderBatches<'_> {
    type Item = Result<RenderBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let renderer = LineRenderer::new(&self.grammar, &self.theme, &self.styler);
        let mut renderables = Vec::with_capacity(self.batch_size);
        while renderables.len() < self.batch_size {
            if self.cancelled() {
                tracing::debug!("Batch rendering cancelled at batch {}", self.batch_index);
                return self.stop();
            }
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => break,
            };
            match renderer.render_line(&line, &mut self.state) {
                Ok(renderable) => renderables.push(renderable),
                Err(source) => {
                    let error = renderer.failure(self.offset + renderables.len(), source);
                    self.done = true;
                    return Some(Err(error));
                }
            }
        }

        if renderables.is_empty() || self.cancelled() {
            return self.stop();
        }

        let batch = RenderBatch {
            batch_index: self.batch_index,
            file_offset: self.offset,
            renderables,
        };
        self.batch_index += 1;
        self.offset += batch.renderables.len();
        if let Some(progress) = self.progress.as_mut() {
            progress(BatchProgress {
                batch_index: batch.batch_index,
                lines_processed: self.offset,
            });
        }
        Some(Ok(batch))
    }
}
