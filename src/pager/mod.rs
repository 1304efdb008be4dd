//! Interactive pager over rendered output
//!
//! Scrolls in renderable units. The content area is drawn with ratatui; the
//! last terminal row holds the footer. The pager owns the terminal for the
//! whole of [`Pager::show`] and restores it on every exit path.

pub mod footer;
pub mod terminal;
pub mod viewport;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use self::footer::FooterRenderer;
use self::terminal::TerminalSession;
use self::viewport::PagerViewport;
use crate::config::RenderConfig;
use crate::view::highlighted_text::{digit_count, HighlightedText};
use crate::view::renderable::Renderable;

/// What the pager shows: a caller's container or a shared item list
pub enum PagerTarget<'a> {
    Borrowed(&'a mut HighlightedText),
    Owned(HighlightedText),
}

impl PagerTarget<'_> {
    fn container(&mut self) -> &mut HighlightedText {
        match self {
            Self::Borrowed(container) => container,
            Self::Owned(container) => container,
        }
    }
}

impl<'a> From<&'a mut HighlightedText> for PagerTarget<'a> {
    fn from(container: &'a mut HighlightedText) -> Self {
        Self::Borrowed(container)
    }
}

impl From<HighlightedText> for PagerTarget<'_> {
    fn from(container: HighlightedText) -> Self {
        Self::Owned(container)
    }
}

impl From<Arc<[Renderable]>> for PagerTarget<'_> {
    fn from(items: Arc<[Renderable]>) -> Self {
        Self::Owned(HighlightedText::from_shared(items))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerAction {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Quit,
}

impl PagerAction {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        Some(match key.code {
            KeyCode::Up => Self::Up,
            KeyCode::Down => Self::Down,
            KeyCode::PageUp => Self::PageUp,
            KeyCode::PageDown | KeyCode::Char(' ') => Self::PageDown,
            KeyCode::Home => Self::Home,
            KeyCode::End => Self::End,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            _ => return None,
        })
    }

    /// Apply to `viewport`; returns false for `Quit`
    pub fn apply(self, viewport: &mut PagerViewport) -> bool {
        match self {
            Self::Up => viewport.scroll_up(),
            Self::Down => viewport.scroll_down(),
            Self::PageUp => viewport.page_up(),
            Self::PageDown => viewport.page_down(),
            Self::Home => viewport.home(),
            Self::End => viewport.end(),
            Self::Quit => return false,
        }
        true
    }
}

pub struct Pager<'a> {
    target: PagerTarget<'a>,
    alternate: bool,
    poll_interval: Duration,
}

impl<'a> Pager<'a> {
    pub fn new(target: impl Into<PagerTarget<'a>>) -> Self {
        Self {
            target: target.into(),
            alternate: true,
            poll_interval: RenderConfig::default().pager_poll_interval(),
        }
    }

    pub fn with_config(mut self, config: &RenderConfig) -> Self {
        self.poll_interval = config.pager_poll_interval();
        self
    }

    /// Use the alternate screen buffer (default on)
    pub fn alternate_screen(mut self, alternate: bool) -> Self {
        self.alternate = alternate;
        self
    }

    /// Run until the user quits
    ///
    /// Only terminal I/O errors are returned, after the terminal is restored.
    pub fn show(mut self) -> io::Result<()> {
        let poll_interval = self.poll_interval;
        let alternate = self.alternate;
        let container = self.target.container();
        let total = container.line_count();
        if total == 0 {
            return Ok(());
        }

        let mut scope = container.view_scope();
        let source = scope.source();
        if scope.show_line_numbers {
            scope.line_number_width = Some(digit_count(scope.line_number_start + total - 1));
        }

        let (mut width, mut height) = crossterm::terminal::size()?;
        let mut viewport = PagerViewport::new(total, PagerViewport::content_rows_for(height));
        let mut session =
            TerminalSession::enter(io::stdout(), alternate, viewport.content_rows() as u16)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        tracing::debug!("Pager started: {} items, {}x{}", total, width, height);

        let mut dirty = true;
        loop {
            let (w, h) = crossterm::terminal::size()?;
            if (w, h) != (width, height) {
                if h < height {
                    queue!(
                        session.writer(),
                        Clear(ClearType::All),
                        Clear(ClearType::Purge)
                    )?;
                    terminal.clear()?;
                }
                viewport.resize(PagerViewport::content_rows_for(h));
                session.set_scroll_region(viewport.content_rows() as u16)?;
                (width, height) = (w, h);
                dirty = true;
            }

            if dirty {
                let content_width = scope.content_width(width as usize);
                viewport.update_heights(|index| {
                    let item = &source[index];
                    if item.is_image() {
                        1
                    } else {
                        item.height(content_width)
                    }
                });
                viewport.clamp();

                let visible = viewport.visible_range();
                scope.show_slice(visible.start, visible.len());
                let text = scope.to_text(width as usize);
                let (start, end) = viewport.position();

                terminal.draw(|frame| {
                    let [body, footer] =
                        Layout::vertical([Constraint::Min(1), Constraint::Length(1)])
                            .areas(frame.area());
                    frame.render_widget(Paragraph::new(text), body);
                    FooterRenderer::render(frame, footer, start, end, total);
                })?;
                dirty = false;
            }

            if !event::poll(poll_interval)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => {
                    if let Some(action) = PagerAction::from_key(&key) {
                        if !action.apply(&mut viewport) {
                            break;
                        }
                        dirty = true;
                    }
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        tracing::debug!("Pager closed at item {}", viewport.top);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_key_bindings() {
        let none = KeyModifiers::NONE;
        assert_eq!(PagerAction::from_key(&key(KeyCode::Up, none)), Some(PagerAction::Up));
        assert_eq!(
            PagerAction::from_key(&key(KeyCode::Char(' '), none)),
            Some(PagerAction::PageDown)
        );
        assert_eq!(
            PagerAction::from_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(PagerAction::Quit)
        );
        assert_eq!(PagerAction::from_key(&key(KeyCode::Esc, none)), Some(PagerAction::Quit));
        assert_eq!(PagerAction::from_key(&key(KeyCode::Char('c'), none)), None);
    }

    #[test]
    fn test_actions_move_viewport() {
        let mut viewport = PagerViewport::new(50, 10);
        assert!(PagerAction::End.apply(&mut viewport));
        assert_eq!(viewport.top, 40);
        assert!(PagerAction::PageDown.apply(&mut viewport));
        assert_eq!(viewport.top, 40);
        assert!(PagerAction::Home.apply(&mut viewport));
        assert_eq!(viewport.top, 0);
        assert!(!PagerAction::Quit.apply(&mut viewport));
    }

    #[test]
    fn test_empty_sequence_is_noop() {
        let items: Arc<[Renderable]> = Vec::new().into();
        assert!(Pager::new(items).show().is_ok());
    }

    #[test]
    fn test_targets() {
        let mut container = HighlightedText::new(vec![Renderable::text("a")]);
        let mut target = PagerTarget::from(&mut container);
        assert_eq!(target.container().line_count(), 1);
        let items: Arc<[Renderable]> = vec![Renderable::Blank, Renderable::Blank].into();
        let mut owned = PagerTarget::from(items);
        assert_eq!(owned.container().line_count(), 2);
    }
}
