//! Page rasterizer abstraction over the PDF engine
//!
//! The viewer treats the engine as an opaque page rasterizer: open a
//! document, ask for a page's intrinsic size, rasterize a page at a scale.
//! The MuPDF implementation lives behind the same trait the tests fake.

use std::path::Path;

use mupdf::{Colorspace, Document, Matrix};

use super::request::RasterFault;
use super::types::{PageBitmap, PageSize};

/// Opens documents. One rasterizer instance lives on the worker thread.
pub trait PageRasterizer: Send + 'static {
    type Doc: OpenDocument;

    fn open(&mut self, path: &Path) -> Result<Self::Doc, RasterFault>;
}

/// A loaded multi-page document.
pub trait OpenDocument {
    fn page_count(&self) -> u32;

    fn title(&self) -> Option<String>;

    /// Intrinsic (unscaled) dimensions of a 1-indexed page.
    fn page_size(&mut self, page: u32) -> Result<PageSize, RasterFault>;

    /// Rasterize a 1-indexed page at `scale`.
    fn render(&mut self, page: u32, scale: f32) -> Result<PageBitmap, RasterFault>;
}

/// MuPDF-backed rasterizer.
#[derive(Debug, Default)]
pub struct MupdfRasterizer;

impl MupdfRasterizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PageRasterizer for MupdfRasterizer {
    type Doc = MupdfDocument;

    fn open(&mut self, path: &Path) -> Result<Self::Doc, RasterFault> {
        let doc = Document::open(path.to_string_lossy().as_ref())
            .map_err(|e| RasterFault::load(e))?;
        let page_count = doc.page_count().map_err(|e| RasterFault::load(e))?;
        if page_count <= 0 {
            return Err(RasterFault::load("document has no pages"));
        }

        let title = doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty());

        Ok(MupdfDocument {
            doc,
            page_count: page_count as u32,
            title,
        })
    }
}

/// Document handle owned by the worker for the lifetime of one open catalog.
pub struct MupdfDocument {
    doc: Document,
    page_count: u32,
    title: Option<String>,
}

impl MupdfDocument {
    /// 1-indexed page number to the engine's 0-indexed page, bounds-checked.
    fn page_index(&self, page: u32) -> Result<i32, RasterFault> {
        if page == 0 || page > self.page_count {
            return Err(RasterFault::page_fetch(
                page,
                format!("page out of range 1..={}", self.page_count),
            ));
        }
        Ok((page - 1) as i32)
    }
}

impl OpenDocument for MupdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn page_size(&mut self, page: u32) -> Result<PageSize, RasterFault> {
        let idx = self.page_index(page)?;
        let loaded = self
            .doc
            .load_page(idx)
            .map_err(|e| RasterFault::page_fetch(page, e))?;
        let bounds = loaded
            .bounds()
            .map_err(|e| RasterFault::page_fetch(page, e))?;
        Ok(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn render(&mut self, page: u32, scale: f32) -> Result<PageBitmap, RasterFault> {
        let idx = self.page_index(page)?;
        let loaded = self
            .doc
            .load_page(idx)
            .map_err(|e| RasterFault::page_fetch(page, e))?;

        let transform = Matrix::new_scale(scale, scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = loaded
            .to_pixmap(&transform, &rgb, false, false)
            .map_err(|e| RasterFault::render(page, e))?;

        let pixels = pixmap_to_rgb(&pixmap).map_err(|detail| RasterFault::render(page, detail))?;
        Ok(PageBitmap {
            pixels,
            width: pixmap.width(),
            height: pixmap.height(),
        })
    }
}

/// Repack pixmap samples into a tight RGB buffer, dropping row padding and
/// any alpha channel.
fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err("pixmap buffer size mismatch".to_string());
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}
