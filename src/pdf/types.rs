//! Core types for page rasterization

/// Intrinsic page dimensions in document units (unscaled).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Output surface dimensions in pixels.
///
/// For the terminal presenter one cell column is one pixel wide and one cell
/// row is two pixels tall (half-block rendering), so a `w x h` cell area maps
/// to a `w x 2h` pixel surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Surface covered by a terminal cell area.
    #[must_use]
    pub fn from_cells(r: ratatui::layout::Rect) -> Self {
        Self::new(u32::from(r.width), u32::from(r.height) * 2)
    }
}

/// Raw rasterized page bitmap (RGB, 3 bytes per pixel).
#[derive(Clone)]
pub struct PageBitmap {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for PageBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}
