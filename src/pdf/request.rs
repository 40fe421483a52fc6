//! Requests and responses exchanged with the render worker

use std::path::PathBuf;
use std::sync::Arc;

use super::types::{PageBitmap, SurfaceSize};

/// Unique identifier for render requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Generation counter for an open document.
///
/// Every open bumps the generation; responses carrying a stale generation
/// belong to a torn-down session and are discarded by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocGeneration(pub u64);

impl DocGeneration {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Faults reported by the rasterizer, one variant per failure site.
#[derive(Clone, Debug, thiserror::Error)]
pub enum RasterFault {
    #[error("failed to open document: {detail}")]
    Load { detail: String },

    #[error("failed to fetch page {page}: {detail}")]
    PageFetch { page: u32, detail: String },

    #[error("failed to render page {page}: {detail}")]
    Render { page: u32, detail: String },
}

impl RasterFault {
    pub fn load(detail: impl std::fmt::Display) -> Self {
        Self::Load {
            detail: detail.to_string(),
        }
    }

    pub fn page_fetch(page: u32, detail: impl std::fmt::Display) -> Self {
        Self::PageFetch {
            page,
            detail: detail.to_string(),
        }
    }

    pub fn render(page: u32, detail: impl std::fmt::Display) -> Self {
        Self::Render {
            page,
            detail: detail.to_string(),
        }
    }
}

/// Request sent to the render worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Open a document, replacing whatever was open before.
    OpenDocument { doc: DocGeneration, path: PathBuf },

    /// Rasterize one page at the scale that fits `surface`.
    RenderPage {
        doc: DocGeneration,
        id: RequestId,
        page: u32,
        surface: SurfaceSize,
    },

    /// Release the document handle for a closed viewer.
    CloseDocument { doc: DocGeneration },

    /// Shut down the worker thread.
    Shutdown,
}

/// Response from the render worker.
#[derive(Debug)]
pub enum WorkerResponse {
    /// Document metadata, sent once per successful open.
    DocumentOpened {
        doc: DocGeneration,
        page_count: u32,
        title: Option<String>,
    },

    /// The document could not be loaded.
    DocumentFailed {
        doc: DocGeneration,
        fault: RasterFault,
    },

    /// A rasterized page.
    PageRendered {
        doc: DocGeneration,
        id: RequestId,
        page: u32,
        bitmap: Arc<PageBitmap>,
    },

    /// A single page failed to rasterize.
    PageFailed {
        doc: DocGeneration,
        id: RequestId,
        page: u32,
        fault: RasterFault,
    },
}
