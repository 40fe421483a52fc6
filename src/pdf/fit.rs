//! Fit-to-surface scale calculation
//!
//! "Contain" semantics: the whole page stays visible, aspect ratio preserved,
//! leftover space absorbed by centering. The scale is recomputed before every
//! rasterization because the surface size is read live and never cached
//! across resizes.

use super::types::{PageSize, SurfaceSize};

/// Scale that fits `page` entirely inside `surface`.
///
/// Returns `None` when either dimension is degenerate (surface not laid out
/// yet, or a page reporting a non-positive size); callers defer rendering
/// instead of working with a zero or negative scale.
#[must_use]
pub fn fit_scale(surface: SurfaceSize, page: PageSize) -> Option<f32> {
    if surface.width == 0 || surface.height == 0 {
        return None;
    }
    if page.width <= 0.0 || page.height <= 0.0 {
        return None;
    }

    let scale_x = surface.width as f32 / page.width;
    let scale_y = surface.height as f32 / page.height;
    let scale = scale_x.min(scale_y);

    scale.is_finite().then_some(scale)
}

/// Pixel dimensions of a page rasterized at `scale`.
#[must_use]
pub fn scaled_dimensions(page: PageSize, scale: f32) -> (u32, u32) {
    let width = (page.width * scale).round().max(1.0) as u32;
    let height = (page.height * scale).round().max(1.0) as u32;
    (width, height)
}
