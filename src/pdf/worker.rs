//! Render worker - runs in a dedicated thread
//!
//! A single worker serializes all rasterization: rendering one page is
//! mutually exclusive with rendering another into the same surface. The
//! worker owns the engine's document handle for exactly one open catalog at
//! a time; opening a new one replaces it, closing drops it.

use flume::{Receiver, Sender};
use log::{debug, info};

use super::fit::fit_scale;
use super::rasterizer::{OpenDocument, PageRasterizer};
use super::request::{DocGeneration, RasterFault, WorkerRequest, WorkerResponse};
use std::sync::Arc;

/// Main worker loop. Exits when the request channel closes or a
/// [`WorkerRequest::Shutdown`] arrives.
pub fn render_worker<R: PageRasterizer>(
    mut rasterizer: R,
    requests: Receiver<WorkerRequest>,
    responses: Sender<WorkerResponse>,
) {
    let mut open: Option<(DocGeneration, R::Doc)> = None;

    for request in requests {
        match request {
            WorkerRequest::OpenDocument { doc, path } => {
                // Replacing the handle tears down the previous session's
                // document before the new one is created.
                open = None;
                match rasterizer.open(&path) {
                    Ok(loaded) => {
                        info!(
                            "opened {path:?}: {pages} pages",
                            pages = loaded.page_count()
                        );
                        let _ = responses.send(WorkerResponse::DocumentOpened {
                            doc,
                            page_count: loaded.page_count(),
                            title: loaded.title(),
                        });
                        open = Some((doc, loaded));
                    }
                    Err(fault) => {
                        let _ = responses.send(WorkerResponse::DocumentFailed { doc, fault });
                    }
                }
            }

            WorkerRequest::RenderPage {
                doc,
                id,
                page,
                surface,
            } => {
                let Some((current, loaded)) = open.as_mut() else {
                    debug!("dropping render of page {page}: no document open");
                    continue;
                };
                if *current != doc {
                    debug!("dropping render of page {page}: superseded document");
                    continue;
                }

                match rasterize(loaded, page, surface) {
                    Ok(bitmap) => {
                        let _ = responses.send(WorkerResponse::PageRendered {
                            doc,
                            id,
                            page,
                            bitmap: Arc::new(bitmap),
                        });
                    }
                    Err(fault) => {
                        let _ = responses.send(WorkerResponse::PageFailed {
                            doc,
                            id,
                            page,
                            fault,
                        });
                    }
                }
            }

            WorkerRequest::CloseDocument { doc } => {
                if open.as_ref().is_some_and(|(current, _)| *current == doc) {
                    open = None;
                }
            }

            WorkerRequest::Shutdown => break,
        }
    }
}

/// Fit is computed here, per rasterization, from the live surface size the
/// controller captured at dispatch time and the page's intrinsic size.
fn rasterize<D: OpenDocument>(
    doc: &mut D,
    page: u32,
    surface: super::types::SurfaceSize,
) -> Result<super::types::PageBitmap, RasterFault> {
    let size = doc.page_size(page)?;
    let scale = fit_scale(surface, size)
        .ok_or_else(|| RasterFault::render(page, "degenerate surface or page size"))?;
    doc.render(page, scale)
}
