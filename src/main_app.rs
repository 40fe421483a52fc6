//! Application shell: catalog list plus the viewer opened on top of it
//!
//! The shell owns the render worker, the library listing, and the one
//! viewer instance. It is also the place that tells the viewer explicitly
//! when it opens and closes and how large its surface is; the viewer never
//! watches anything.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use log::error;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::event_source::{EventSource, KeyCode};
use crate::library::{CatalogEntry, CatalogLibrary};
use crate::pdf::{MupdfRasterizer, SurfaceSize, WorkerRequest, render_worker};
use crate::settings;
use crate::theme::{Base16Palette, palette_by_name};
use crate::viewer::{CatalogViewer, PageView, ViewerPhase};

const TICK_RATE: Duration = Duration::from_millis(50);
const ANIMATION_TICK: Duration = Duration::from_millis(16);

pub struct App {
    library: CatalogLibrary,
    entries: Vec<CatalogEntry>,
    library_error: Option<String>,
    list_state: ListState,
    viewer: CatalogViewer,
    palette: &'static Base16Palette,
    /// Content area of the last viewer draw, for mapping mouse coordinates.
    page_area: Option<Rect>,
    /// Kept for the shutdown message on drop; the viewer holds its own
    /// sender for render traffic.
    request_tx: flume::Sender<WorkerRequest>,
    should_quit: bool,
}

impl App {
    /// Build the app and spawn the render worker thread.
    #[must_use]
    pub fn new(library_dir: PathBuf) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        std::thread::spawn(move || render_worker(MupdfRasterizer::new(), request_rx, response_tx));

        let viewer = CatalogViewer::new(
            request_tx.clone(),
            response_rx,
            settings::zoom_config(),
            settings::drag_threshold(),
        );

        let mut app = Self {
            library: CatalogLibrary::new(library_dir),
            entries: Vec::new(),
            library_error: None,
            list_state: ListState::default(),
            viewer,
            palette: palette_by_name(&settings::theme_name()),
            page_area: None,
            request_tx,
            should_quit: false,
        };
        app.refresh_library();
        app
    }

    pub fn refresh_library(&mut self) {
        match self.library.entries() {
            Ok(entries) => {
                self.entries = entries;
                self.library_error = None;
            }
            Err(e) => {
                error!(
                    "library scan of {root:?} failed: {e}",
                    root = self.library.root()
                );
                self.entries.clear();
                self.library_error = Some(e.to_string());
            }
        }
        self.list_state
            .select((!self.entries.is_empty()).then_some(0));
    }

    /// Open a catalog directly, bypassing the list.
    pub fn open_catalog(&mut self, path: PathBuf, name: String) {
        self.page_area = None;
        self.viewer.open(path, name);
    }

    fn open_selected(&mut self) {
        let Some(entry) = self.list_state.selected().and_then(|i| self.entries.get(i)) else {
            return;
        };
        let (path, name) = (entry.path.clone(), entry.name.clone());
        self.open_catalog(path, name);
    }

    fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let next = self
            .list_state
            .selected()
            .map_or(0, |i| (i + 1).min(self.entries.len() - 1));
        self.list_state.select(Some(next));
    }

    fn select_previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let prev = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(prev));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.viewer.is_open() {
            use crate::viewer::ViewerAction;
            match self.viewer.handle_key(key.code) {
                ViewerAction::Handled => {}
                ViewerAction::Closed => self.page_area = None,
                ViewerAction::Ignored => {
                    if key.code == KeyCode::Char('q') {
                        self.should_quit = true;
                    }
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            KeyCode::Char('r') => self.refresh_library(),
            KeyCode::Enter => self.open_selected(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !self.viewer.is_open() {
            return;
        }
        let Some(area) = self.page_area else {
            return;
        };

        match mouse.kind {
            MouseEventKind::Down(_) => {
                // Gestures start inside the page area only.
                if !area.contains(Position::new(mouse.column, mouse.row)) {
                    return;
                }
                self.viewer.handle_mouse(
                    mouse.kind,
                    mouse.column - area.x,
                    mouse.row - area.y,
                );
            }
            // Moves and releases follow the gesture even outside the area,
            // so a drag that leaves the page does not get stuck.
            MouseEventKind::Drag(_) | MouseEventKind::Up(_) => {
                self.viewer.handle_mouse(
                    mouse.kind,
                    mouse.column.saturating_sub(area.x),
                    mouse.row.saturating_sub(area.y),
                );
            }
            _ => {}
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        if self.viewer.is_open() {
            self.draw_viewer(f);
        } else {
            self.draw_library(f);
        }
    }

    fn draw_library(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(f.area());

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Catalogs")
            .border_style(Style::default().fg(self.palette.base_03));

        if let Some(error) = &self.library_error {
            let msg = Paragraph::new(error.as_str())
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(self.palette.base_08));
            f.render_widget(msg, chunks[0]);
        } else if self.entries.is_empty() {
            let msg = Paragraph::new("No catalogs yet.")
                .block(block)
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.palette.base_03));
            f.render_widget(msg, chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .entries
                .iter()
                .map(|entry| {
                    ListItem::new(Line::from(Span::styled(
                        entry.summary(),
                        Style::default().fg(self.palette.base_05),
                    )))
                })
                .collect();
            let list = List::new(items).block(block).highlight_style(
                Style::default()
                    .bg(self.palette.base_02)
                    .fg(self.palette.base_06),
            );
            f.render_stateful_widget(list, chunks[0], &mut self.list_state);
        }

        let help = Paragraph::new("j/k: Navigate | Enter: Open | r: Refresh | q: Quit")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.palette.base_03)),
            )
            .style(Style::default().fg(self.palette.base_03));
        f.render_widget(help, chunks[1]);
    }

    fn draw_viewer(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        let title = Paragraph::new(self.viewer.title())
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(self.palette.base_06)
                    .bg(self.palette.base_01)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(title, chunks[0]);

        let content = chunks[1];
        self.page_area = Some(content);
        self.viewer.set_surface(SurfaceSize::from_cells(content));

        match self.viewer.phase() {
            ViewerPhase::Loading => {
                let msg = Paragraph::new("Loading catalog...")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(self.palette.base_03));
                f.render_widget(msg, centered_line(content));
            }
            ViewerPhase::Failed(reason) => {
                let msg = Paragraph::new(format!("Could not open catalog: {reason}"))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .style(Style::default().fg(self.palette.base_08));
                f.render_widget(msg, centered_line(content));
            }
            ViewerPhase::Ready => {
                if let Some(bitmap) = self.viewer.displayed_bitmap() {
                    let (mag, pan) = self.viewer.transform().displayed(Instant::now());
                    // One cell row is two surface pixels tall.
                    let pan_px = (pan.0, pan.1 * 2.0);
                    let view = PageView::new(bitmap)
                        .transform(mag, pan_px)
                        .background(self.palette.bg_rgb());
                    f.render_widget(view, content);
                }
            }
            ViewerPhase::Closed => {}
        }

        f.render_widget(self.status_line(), chunks[2]);
    }

    fn status_line(&self) -> Paragraph<'_> {
        let dim = Style::default().fg(self.palette.base_02);
        let normal = Style::default().fg(self.palette.base_04);
        let accent = Style::default().fg(self.palette.base_0c);

        let mut spans = vec![Span::styled(self.viewer.indicator().to_string(), accent)];

        if *self.viewer.phase() == ViewerPhase::Ready {
            let transform = self.viewer.transform();
            let zoom_hint = if transform.is_dragging() {
                "drag: panning"
            } else if transform.is_zoomed() {
                "click: zoom out / drag: pan"
            } else {
                "click: zoom in"
            };
            spans.extend([
                Span::styled("  ", normal),
                Span::styled(
                    "\u{2190} prev",
                    if self.viewer.at_first_page() { dim } else { normal },
                ),
                Span::styled("  ", normal),
                Span::styled(
                    "next \u{2192}",
                    if self.viewer.at_last_page() { dim } else { normal },
                ),
                Span::styled("  ", normal),
                Span::styled(zoom_hint, normal),
            ]);
        }
        spans.push(Span::styled("  Esc: close", normal));

        if let Some(notice) = self.viewer.notice() {
            spans.push(Span::styled(
                format!("  {notice}"),
                Style::default().fg(self.palette.base_0a),
            ));
        }

        Paragraph::new(Line::from(spans)).style(Style::default().bg(self.palette.base_01))
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.request_tx.send(WorkerRequest::Shutdown);
    }
}

/// Middle line of an area, for short centered messages.
fn centered_line(area: Rect) -> Rect {
    if area.height == 0 {
        return area;
    }
    Rect::new(area.x, area.y + area.height / 2, area.width, 1)
}

/// Main event loop, driven by an injectable event source.
pub fn run_app_with_event_source<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut E,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.draw(f))?;

        let animating = app.viewer.transform_mut().tick_animation(Instant::now());
        let timeout = if animating { ANIMATION_TICK } else { TICK_RATE };

        if events.poll(timeout)? {
            match events.read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        app.viewer.poll_responses();

        if app.should_quit {
            return Ok(());
        }
    }
}
