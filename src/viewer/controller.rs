//! Catalog viewer controller
//!
//! Binds document lifecycle, page navigation, the render scheduler, and the
//! zoom/pan transform for the one catalog open at a time. All engine work
//! happens on the render worker; the controller exchanges requests and
//! responses over channels and owns every piece of per-session state.

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use flume::{Receiver, Sender};
use log::{debug, info, warn};

use crate::inputs::{ClickType, MouseTracker};
use crate::pdf::{
    Dispatch, DocGeneration, PageBitmap, RenderScheduler, SurfaceSize, WorkerRequest,
    WorkerResponse,
};

use super::transform::{Transform, ZoomConfig};

/// Lifecycle of the viewer surface.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ViewerPhase {
    /// No catalog open; all input is inert.
    #[default]
    Closed,
    /// Document load in flight; a loading indicator is shown.
    Loading,
    /// The document failed to load. The message replaces the loading
    /// indicator and the viewer stays open but inert except for close.
    Failed(String),
    /// Document open, pages rendering on demand.
    Ready,
}

/// What a key event did, so the shell can react to the viewer closing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerAction {
    Ignored,
    Handled,
    Closed,
}

/// The page bitmap currently on screen.
struct DisplayedPage {
    page: u32,
    bitmap: Arc<PageBitmap>,
}

pub struct CatalogViewer {
    request_tx: Sender<WorkerRequest>,
    response_rx: Receiver<WorkerResponse>,
    generation: DocGeneration,
    phase: ViewerPhase,
    title: String,
    /// Current page, 1-indexed.
    page: u32,
    page_count: u32,
    scheduler: RenderScheduler,
    transform: Transform,
    zoom_cfg: ZoomConfig,
    mouse: MouseTracker,
    /// Live surface size, updated by the shell on layout/resize.
    surface: Option<SurfaceSize>,
    /// A render is wanted but the surface was not laid out yet.
    deferred_render: bool,
    displayed: Option<DisplayedPage>,
    indicator: String,
    /// Transient notice for a page that failed to rasterize; the content
    /// area keeps its last-good page.
    notice: Option<String>,
}

impl CatalogViewer {
    #[must_use]
    pub fn new(
        request_tx: Sender<WorkerRequest>,
        response_rx: Receiver<WorkerResponse>,
        zoom_cfg: ZoomConfig,
        drag_threshold: u16,
    ) -> Self {
        Self {
            request_tx,
            response_rx,
            generation: DocGeneration::new(0),
            phase: ViewerPhase::Closed,
            title: String::new(),
            page: 1,
            page_count: 0,
            scheduler: RenderScheduler::new(),
            transform: Transform::new(),
            zoom_cfg,
            mouse: MouseTracker::new(drag_threshold),
            surface: None,
            deferred_render: false,
            displayed: None,
            indicator: String::new(),
            notice: None,
        }
    }

    /// Open a catalog, tearing down any session that was open before.
    pub fn open(&mut self, path: PathBuf, title: String) {
        info!("opening catalog {title:?} from {path:?}");
        self.generation = self.generation.next();
        self.phase = ViewerPhase::Loading;
        self.title = title;
        self.page = 1;
        self.page_count = 0;
        self.scheduler.reset();
        self.transform.reset();
        self.mouse.cancel();
        self.displayed = None;
        self.indicator.clear();
        self.notice = None;
        self.deferred_render = false;

        let _ = self.request_tx.send(WorkerRequest::OpenDocument {
            doc: self.generation,
            path,
        });
    }

    /// Release the document handle and clear all session state.
    pub fn close(&mut self) {
        if self.phase == ViewerPhase::Closed {
            return;
        }
        let _ = self.request_tx.send(WorkerRequest::CloseDocument {
            doc: self.generation,
        });
        // Bumping the generation makes any response still in flight stale.
        self.generation = self.generation.next();
        self.phase = ViewerPhase::Closed;
        self.title.clear();
        self.page = 1;
        self.page_count = 0;
        self.scheduler.reset();
        self.transform.reset();
        self.mouse.cancel();
        self.displayed = None;
        self.indicator.clear();
        self.notice = None;
        self.deferred_render = false;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.phase != ViewerPhase::Closed
    }

    #[must_use]
    pub fn phase(&self) -> &ViewerPhase {
        &self.phase
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// "Page n / total" text, updated on every completed render.
    #[must_use]
    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub fn displayed_bitmap(&self) -> Option<&PageBitmap> {
        self.displayed.as_ref().map(|d| d.bitmap.as_ref())
    }

    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    #[must_use]
    pub fn at_first_page(&self) -> bool {
        self.page <= 1
    }

    #[must_use]
    pub fn at_last_page(&self) -> bool {
        self.page >= self.page_count
    }

    /// Step forward. No-op on the last page.
    pub fn next_page(&mut self) {
        if self.phase != ViewerPhase::Ready || self.at_last_page() {
            return;
        }
        self.page += 1;
        self.transform.reset();
        self.request_render(self.page);
    }

    /// Step back. No-op on the first page.
    pub fn previous_page(&mut self) {
        if self.phase != ViewerPhase::Ready || self.at_first_page() {
            return;
        }
        self.page -= 1;
        self.transform.reset();
        self.request_render(self.page);
    }

    /// The shell reports the live surface size here on every layout pass;
    /// a changed size re-rasterizes the current page at the new fit scale.
    pub fn set_surface(&mut self, surface: SurfaceSize) {
        if self.surface == Some(surface) {
            if self.deferred_render {
                self.deferred_render = false;
                self.request_render(self.page);
            }
            return;
        }
        self.surface = Some(surface);
        if self.phase == ViewerPhase::Ready {
            self.deferred_render = false;
            self.request_render(self.page);
        }
    }

    /// Ask the scheduler for a render of `page` at the current fit.
    fn request_render(&mut self, page: u32) {
        let surface = self.surface.filter(|s| s.width > 0 && s.height > 0);
        let Some(surface) = surface else {
            // Not laid out yet; retried once the shell reports a surface.
            self.deferred_render = true;
            return;
        };

        match self.scheduler.request(page) {
            Dispatch::Start(id) => {
                let _ = self.request_tx.send(WorkerRequest::RenderPage {
                    doc: self.generation,
                    id,
                    page,
                    surface,
                });
            }
            Dispatch::Coalesced => {}
        }
    }

    /// Drain worker responses. Returns true if anything on screen changed.
    pub fn poll_responses(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.response_rx.try_recv() {
            changed |= self.handle_response(response);
        }
        changed
    }

    fn handle_response(&mut self, response: WorkerResponse) -> bool {
        match response {
            WorkerResponse::DocumentOpened {
                doc,
                page_count,
                title,
            } => {
                if doc != self.generation {
                    debug!("discarding stale document-open response");
                    return false;
                }
                self.phase = ViewerPhase::Ready;
                self.page_count = page_count;
                self.page = 1;
                if self.title.is_empty() {
                    self.title = title.unwrap_or_default();
                }
                self.request_render(1);
                true
            }

            WorkerResponse::DocumentFailed { doc, fault } => {
                if doc != self.generation {
                    debug!("discarding stale document-failure response");
                    return false;
                }
                warn!("catalog failed to load: {fault}");
                self.phase = ViewerPhase::Failed(fault.to_string());
                true
            }

            WorkerResponse::PageRendered {
                doc,
                id,
                page,
                bitmap,
            } => {
                if doc != self.generation {
                    debug!("discarding stale render of page {page}");
                    return false;
                }
                if let Some(next) = self.scheduler.complete(id) {
                    self.request_render(next);
                }
                self.displayed = Some(DisplayedPage { page, bitmap });
                self.indicator = format!("Page {page} / {count}", count = self.page_count);
                self.notice = None;
                true
            }

            WorkerResponse::PageFailed {
                doc,
                id,
                page,
                fault,
            } => {
                if doc != self.generation {
                    debug!("discarding stale failure of page {page}");
                    return false;
                }
                // The failed page keeps whatever was last on screen and is
                // not retried; navigation stays unblocked.
                if let Some(next) = self.scheduler.complete(id) {
                    self.request_render(next);
                }
                warn!("page {page} failed to rasterize: {fault}");
                self.notice = Some(fault.to_string());
                true
            }
        }
    }

    /// Keyboard bindings: arrows page, Escape closes. Inert while closed.
    pub fn handle_key(&mut self, code: KeyCode) -> ViewerAction {
        if !self.is_open() {
            return ViewerAction::Ignored;
        }
        match code {
            KeyCode::Left => {
                self.previous_page();
                ViewerAction::Handled
            }
            KeyCode::Right => {
                self.next_page();
                ViewerAction::Handled
            }
            KeyCode::Esc => {
                self.close();
                ViewerAction::Closed
            }
            _ => ViewerAction::Ignored,
        }
    }

    /// Pointer input in page-area cell coordinates: tap toggles zoom, drag
    /// pans while zoomed. A release classified as a drag never toggles.
    pub fn handle_mouse(&mut self, kind: MouseEventKind, x: u16, y: u16) -> bool {
        if self.phase != ViewerPhase::Ready {
            return false;
        }
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.mouse.press(x, y);
                if self.transform.is_zoomed() {
                    self.transform.begin_drag(x, y);
                }
                true
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.mouse.moved(x, y);
                if self.transform.is_dragging() {
                    self.transform.drag_to(x, y);
                    true
                } else {
                    false
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let gesture = self.mouse.release(x, y);
                self.transform.end_drag();
                if gesture == Some(ClickType::Click) {
                    self.transform.toggle_zoom(&self.zoom_cfg);
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{RasterFault, RequestId};
    use std::time::Duration;

    struct Harness {
        viewer: CatalogViewer,
        worker_rx: Receiver<WorkerRequest>,
        worker_tx: Sender<WorkerResponse>,
    }

    fn harness() -> Harness {
        let (req_tx, req_rx) = flume::unbounded();
        let (resp_tx, resp_rx) = flume::unbounded();
        let cfg = ZoomConfig {
            magnification: 2.5,
            animation: Duration::ZERO,
        };
        Harness {
            viewer: CatalogViewer::new(req_tx, resp_rx, cfg, 2),
            worker_rx: req_rx,
            worker_tx: resp_tx,
        }
    }

    fn bitmap() -> Arc<PageBitmap> {
        Arc::new(PageBitmap {
            pixels: vec![0; 12],
            width: 2,
            height: 2,
        })
    }

    impl Harness {
        fn open_three_pages(&mut self) -> DocGeneration {
            self.viewer.set_surface(SurfaceSize::new(80, 120));
            self.viewer
                .open(PathBuf::from("catalog.pdf"), "Spring".to_string());

            let doc = match self.worker_rx.try_recv().unwrap() {
                WorkerRequest::OpenDocument { doc, .. } => doc,
                other => panic!("expected open request, got {other:?}"),
            };
            self.worker_tx
                .send(WorkerResponse::DocumentOpened {
                    doc,
                    page_count: 3,
                    title: None,
                })
                .unwrap();
            assert!(self.viewer.poll_responses());
            doc
        }

        fn expect_render(&mut self) -> (DocGeneration, RequestId, u32) {
            match self.worker_rx.try_recv().unwrap() {
                WorkerRequest::RenderPage { doc, id, page, .. } => (doc, id, page),
                other => panic!("expected render request, got {other:?}"),
            }
        }

        fn finish_render(&mut self, doc: DocGeneration, id: RequestId, page: u32) {
            self.worker_tx
                .send(WorkerResponse::PageRendered {
                    doc,
                    id,
                    page,
                    bitmap: bitmap(),
                })
                .unwrap();
            assert!(self.viewer.poll_responses());
        }

        fn no_more_requests(&self) {
            assert!(self.worker_rx.try_recv().is_err(), "unexpected request");
        }
    }

    #[test]
    fn open_renders_first_page_and_sets_indicator() {
        let mut h = harness();
        let doc = h.open_three_pages();
        assert_eq!(*h.viewer.phase(), ViewerPhase::Ready);
        assert_eq!(h.viewer.page_count(), 3);

        let (got_doc, id, page) = h.expect_render();
        assert_eq!(got_doc, doc);
        assert_eq!(page, 1);

        h.finish_render(doc, id, 1);
        assert_eq!(h.viewer.indicator(), "Page 1 / 3");
        assert!(h.viewer.displayed_bitmap().is_some());
    }

    #[test]
    fn rapid_navigation_coalesces_and_settles_on_last_page() {
        let mut h = harness();
        let doc = h.open_three_pages();
        let (_, id, _) = h.expect_render();
        h.finish_render(doc, id, 1);

        // Two quick steps: the first starts a render, the second coalesces.
        h.viewer.next_page();
        let (_, id2, page2) = h.expect_render();
        assert_eq!(page2, 2);
        h.viewer.next_page();
        h.no_more_requests();

        // Completing page 2 immediately dispatches the pending page 3.
        h.finish_render(doc, id2, 2);
        assert_eq!(h.viewer.indicator(), "Page 2 / 3");
        let (_, id3, page3) = h.expect_render();
        assert_eq!(page3, 3);
        h.finish_render(doc, id3, 3);
        assert_eq!(h.viewer.indicator(), "Page 3 / 3");

        // At the last page a further step changes nothing.
        h.viewer.next_page();
        h.no_more_requests();
        assert_eq!(h.viewer.page(), 3);
    }

    #[test]
    fn previous_page_at_first_is_a_no_op() {
        let mut h = harness();
        let doc = h.open_three_pages();
        let (_, id, _) = h.expect_render();
        h.finish_render(doc, id, 1);

        h.viewer.previous_page();
        h.no_more_requests();
        assert_eq!(h.viewer.page(), 1);
    }

    #[test]
    fn failed_load_leaves_viewer_inert_except_close() {
        let mut h = harness();
        h.viewer.set_surface(SurfaceSize::new(80, 120));
        h.viewer
            .open(PathBuf::from("broken.pdf"), "Broken".to_string());
        let doc = match h.worker_rx.try_recv().unwrap() {
            WorkerRequest::OpenDocument { doc, .. } => doc,
            other => panic!("expected open request, got {other:?}"),
        };
        h.worker_tx
            .send(WorkerResponse::DocumentFailed {
                doc,
                fault: RasterFault::load("corrupt header"),
            })
            .unwrap();
        h.viewer.poll_responses();

        assert!(matches!(h.viewer.phase(), ViewerPhase::Failed(_)));
        h.viewer.next_page();
        h.no_more_requests();

        assert_eq!(h.viewer.handle_key(KeyCode::Esc), ViewerAction::Closed);
        assert!(!h.viewer.is_open());
    }

    #[test]
    fn page_failure_keeps_last_good_page_and_unblocks_navigation() {
        let mut h = harness();
        let doc = h.open_three_pages();
        let (_, id, _) = h.expect_render();
        h.finish_render(doc, id, 1);

        h.viewer.next_page();
        let (_, id2, _) = h.expect_render();
        h.worker_tx
            .send(WorkerResponse::PageFailed {
                doc,
                id: id2,
                page: 2,
                fault: RasterFault::render(2, "bad stream"),
            })
            .unwrap();
        h.viewer.poll_responses();

        assert!(h.viewer.notice().is_some());
        let shown = h.viewer.displayed_bitmap();
        assert!(shown.is_some(), "last-good page stays on screen");

        // Navigation is not blocked by the failure.
        h.viewer.next_page();
        let (_, id3, page3) = h.expect_render();
        assert_eq!(page3, 3);
        h.finish_render(doc, id3, 3);
        assert!(h.viewer.notice().is_none());
    }

    #[test]
    fn stale_responses_are_discarded_after_reopen() {
        let mut h = harness();
        let old_doc = h.open_three_pages();
        let (_, old_id, _) = h.expect_render();

        // Reopen before the first render completes.
        h.viewer
            .open(PathBuf::from("other.pdf"), "Other".to_string());
        let new_doc = match h.worker_rx.try_recv().unwrap() {
            WorkerRequest::OpenDocument { doc, .. } => doc,
            other => panic!("expected open request, got {other:?}"),
        };
        assert_ne!(old_doc, new_doc);

        h.worker_tx
            .send(WorkerResponse::PageRendered {
                doc: old_doc,
                id: old_id,
                page: 1,
                bitmap: bitmap(),
            })
            .unwrap();
        assert!(!h.viewer.poll_responses());
        assert!(h.viewer.displayed_bitmap().is_none());
        assert_eq!(*h.viewer.phase(), ViewerPhase::Loading);
    }

    #[test]
    fn navigation_resets_zoom_before_requesting_render() {
        let mut h = harness();
        let doc = h.open_three_pages();
        let (_, id, _) = h.expect_render();
        h.finish_render(doc, id, 1);

        // Tap to zoom, drag to pan.
        h.viewer
            .handle_mouse(MouseEventKind::Down(MouseButton::Left), 10, 10);
        h.viewer
            .handle_mouse(MouseEventKind::Up(MouseButton::Left), 10, 10);
        assert!(h.viewer.transform().is_zoomed());
        h.viewer
            .handle_mouse(MouseEventKind::Down(MouseButton::Left), 100, 100);
        h.viewer
            .handle_mouse(MouseEventKind::Drag(MouseButton::Left), 140, 130);
        h.viewer
            .handle_mouse(MouseEventKind::Up(MouseButton::Left), 140, 130);
        assert_eq!(h.viewer.transform().pan(), (40, 30));
        assert!(
            h.viewer.transform().is_zoomed(),
            "a drag must not toggle zoom on release"
        );

        h.viewer.next_page();
        assert!(!h.viewer.transform().is_zoomed());
        assert_eq!(h.viewer.transform().pan(), (0, 0));
    }

    #[test]
    fn tap_toggles_zoom_both_ways() {
        let mut h = harness();
        let doc = h.open_three_pages();
        let (_, id, _) = h.expect_render();
        h.finish_render(doc, id, 1);

        h.viewer
            .handle_mouse(MouseEventKind::Down(MouseButton::Left), 30, 20);
        h.viewer
            .handle_mouse(MouseEventKind::Up(MouseButton::Left), 30, 20);
        assert!(h.viewer.transform().is_zoomed());
        assert!((h.viewer.transform().magnification() - 2.5).abs() < f32::EPSILON);
        assert_eq!(h.viewer.transform().pan(), (0, 0));

        h.viewer
            .handle_mouse(MouseEventKind::Down(MouseButton::Left), 30, 20);
        h.viewer
            .handle_mouse(MouseEventKind::Up(MouseButton::Left), 30, 20);
        assert!(!h.viewer.transform().is_zoomed());
        assert!((h.viewer.transform().magnification() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn resize_rerenders_current_page_at_new_fit() {
        let mut h = harness();
        let doc = h.open_three_pages();
        let (_, id, _) = h.expect_render();
        h.finish_render(doc, id, 1);

        h.viewer.set_surface(SurfaceSize::new(120, 200));
        let (_, _, page) = h.expect_render();
        assert_eq!(page, 1);

        // Same size again is not a resize.
        h.viewer.set_surface(SurfaceSize::new(120, 200));
        h.no_more_requests();
    }

    #[test]
    fn render_defers_until_surface_is_laid_out() {
        let mut h = harness();
        h.viewer
            .open(PathBuf::from("catalog.pdf"), "Spring".to_string());
        let doc = match h.worker_rx.try_recv().unwrap() {
            WorkerRequest::OpenDocument { doc, .. } => doc,
            other => panic!("expected open request, got {other:?}"),
        };
        h.worker_tx
            .send(WorkerResponse::DocumentOpened {
                doc,
                page_count: 3,
                title: None,
            })
            .unwrap();
        h.viewer.poll_responses();

        // Ready, but no surface yet: nothing to dispatch.
        h.no_more_requests();

        h.viewer.set_surface(SurfaceSize::new(80, 120));
        let (_, _, page) = h.expect_render();
        assert_eq!(page, 1);
    }

    #[test]
    fn keys_are_inert_while_closed() {
        let mut h = harness();
        assert_eq!(h.viewer.handle_key(KeyCode::Left), ViewerAction::Ignored);
        assert_eq!(h.viewer.handle_key(KeyCode::Esc), ViewerAction::Ignored);
        h.no_more_requests();
    }
}
