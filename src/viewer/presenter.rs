//! Page presentation: composed transform and half-block output
//!
//! The fitted page bitmap is drawn centered on the surface with the viewer's
//! transform applied on top: translate(pan) then scale(magnification) about
//! the surface center. The visible portion is produced by cropping the
//! fitted bitmap and resampling it, then emitted as half-block cells (one
//! cell column = one pixel, one cell row = two pixel rows).

use fast_image_resize as fir;
use log::warn;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;
use std::num::NonZeroU32;

use crate::pdf::PageBitmap;

/// Where the transformed bitmap lands on the surface.
///
/// `src_*` select the visible region of the bitmap (fractional, in bitmap
/// pixels); `dst_*` place its resampled image on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewMapping {
    pub src_left: f64,
    pub src_top: f64,
    pub src_width: f64,
    pub src_height: f64,
    pub dst_x: u32,
    pub dst_y: u32,
    pub dst_width: u32,
    pub dst_height: u32,
}

/// Compute the visible bitmap region and its placement for a surface of
/// `surface_w` x `surface_h` pixels. Returns `None` when the transform moves
/// the page entirely off-surface.
#[must_use]
pub fn view_mapping(
    bitmap_w: u32,
    bitmap_h: u32,
    surface_w: u32,
    surface_h: u32,
    magnification: f32,
    pan: (f32, f32),
) -> Option<ViewMapping> {
    if bitmap_w == 0 || bitmap_h == 0 || surface_w == 0 || surface_h == 0 {
        return None;
    }
    let mag = f64::from(magnification);
    if !(mag.is_finite() && mag > 0.0) {
        return None;
    }

    let (bw, bh) = (f64::from(bitmap_w), f64::from(bitmap_h));
    let (vw, vh) = (f64::from(surface_w), f64::from(surface_h));
    let pan = (f64::from(pan.0), f64::from(pan.1));

    // The bitmap is centered on the surface; scaling happens about that
    // shared center, then the pan translation is applied.
    let axis = |surface: f64, bitmap: f64, pan: f64| -> Option<(f64, f64, u32, u32)> {
        let center_src = bitmap / 2.0;
        let center_dst = surface / 2.0;
        let src_of = |screen: f64| center_src + (screen - pan - center_dst) / mag;
        let screen_of = |src: f64| center_dst + (src - center_src) * mag + pan;

        let src_lo = src_of(0.0).max(0.0);
        let src_hi = src_of(surface).min(bitmap);
        if src_hi <= src_lo {
            return None;
        }

        let dst_lo = screen_of(src_lo).round().clamp(0.0, surface);
        let dst_hi = screen_of(src_hi).round().clamp(0.0, surface);
        let dst_len = (dst_hi - dst_lo) as u32;
        if dst_len == 0 {
            return None;
        }
        Some((src_lo, src_hi - src_lo, dst_lo as u32, dst_len))
    };

    let (src_left, src_width, dst_x, dst_width) = axis(vw, bw, pan.0)?;
    let (src_top, src_height, dst_y, dst_height) = axis(vh, bh, pan.1)?;

    Some(ViewMapping {
        src_left,
        src_top,
        src_width,
        src_height,
        dst_x,
        dst_y,
        dst_width,
        dst_height,
    })
}

/// Crop + resample the bitmap per `mapping` into a tight RGB buffer of
/// `dst_width * dst_height` pixels.
fn resample(bitmap: &PageBitmap, mapping: &ViewMapping) -> Option<Vec<u8>> {
    let src_w = NonZeroU32::new(bitmap.width)?;
    let src_h = NonZeroU32::new(bitmap.height)?;
    let dst_w = NonZeroU32::new(mapping.dst_width)?;
    let dst_h = NonZeroU32::new(mapping.dst_height)?;

    let src =
        fir::Image::from_vec_u8(src_w, src_h, bitmap.pixels.clone(), fir::PixelType::U8x3).ok()?;
    let mut view = src.view();
    view.set_crop_box(fir::CropBox {
        left: mapping.src_left,
        top: mapping.src_top,
        width: mapping.src_width,
        height: mapping.src_height,
    })
    .ok()?;

    let mut dst = fir::Image::new(dst_w, dst_h, fir::PixelType::U8x3);
    let mut resizer = fir::Resizer::new(fir::ResizeAlg::Nearest);
    resizer.resize(&view, &mut dst.view_mut()).ok()?;
    Some(dst.into_vec())
}

/// Widget that paints a page bitmap with the composed zoom/pan transform.
pub struct PageView<'a> {
    bitmap: &'a PageBitmap,
    magnification: f32,
    /// Pan in surface pixels.
    pan: (f32, f32),
    background: (u8, u8, u8),
}

impl<'a> PageView<'a> {
    #[must_use]
    pub fn new(bitmap: &'a PageBitmap) -> Self {
        Self {
            bitmap,
            magnification: 1.0,
            pan: (0.0, 0.0),
            background: (0, 0, 0),
        }
    }

    #[must_use]
    pub fn transform(mut self, magnification: f32, pan: (f32, f32)) -> Self {
        self.magnification = magnification;
        self.pan = pan;
        self
    }

    #[must_use]
    pub fn background(mut self, rgb: (u8, u8, u8)) -> Self {
        self.background = rgb;
        self
    }
}

impl Widget for PageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let surface_w = u32::from(area.width);
        let surface_h = u32::from(area.height) * 2;

        let mapping = view_mapping(
            self.bitmap.width,
            self.bitmap.height,
            surface_w,
            surface_h,
            self.magnification,
            self.pan,
        );

        // Surface pixels, prefilled with the background.
        let (bg_r, bg_g, bg_b) = self.background;
        let mut surface = vec![0u8; (surface_w * surface_h * 3) as usize];
        for px in surface.chunks_exact_mut(3) {
            px.copy_from_slice(&[bg_r, bg_g, bg_b]);
        }

        if let Some(mapping) = mapping {
            match resample(self.bitmap, &mapping) {
                Some(resampled) => {
                    for row in 0..mapping.dst_height {
                        let src_start = (row * mapping.dst_width * 3) as usize;
                        let src_end = src_start + (mapping.dst_width * 3) as usize;
                        let dst_start =
                            (((mapping.dst_y + row) * surface_w + mapping.dst_x) * 3) as usize;
                        surface[dst_start..dst_start + (mapping.dst_width * 3) as usize]
                            .copy_from_slice(&resampled[src_start..src_end]);
                    }
                }
                None => warn!("page resample failed, leaving surface blank"),
            }
        }

        // Two surface rows per cell row: upper half block carries the top
        // pixel in the foreground, the bottom pixel in the background.
        for row in 0..area.height {
            for col in 0..area.width {
                let top = pixel_at(&surface, surface_w, u32::from(col), u32::from(row) * 2);
                let bottom = pixel_at(&surface, surface_w, u32::from(col), u32::from(row) * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol("\u{2580}")
                        .set_fg(Color::Rgb(top.0, top.1, top.2))
                        .set_bg(Color::Rgb(bottom.0, bottom.1, bottom.2));
                }
            }
        }
    }
}

fn pixel_at(surface: &[u8], width: u32, x: u32, y: u32) -> (u8, u8, u8) {
    let idx = ((y * width + x) * 3) as usize;
    (surface[idx], surface[idx + 1], surface[idx + 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitted_bitmap_maps_one_to_one_centered() {
        // 40x30 bitmap on a 60x30 surface: full source, centered dest.
        let m = view_mapping(40, 30, 60, 30, 1.0, (0.0, 0.0)).unwrap();
        assert!((m.src_left).abs() < 1e-9);
        assert!((m.src_width - 40.0).abs() < 1e-9);
        assert_eq!((m.dst_x, m.dst_width), (10, 40));
        assert_eq!((m.dst_y, m.dst_height), (0, 30));
    }

    #[test]
    fn double_magnification_halves_visible_source() {
        // Same-size bitmap and surface, mag 2, no pan: the centered half of
        // the source fills the whole surface.
        let m = view_mapping(100, 100, 100, 100, 2.0, (0.0, 0.0)).unwrap();
        assert!((m.src_left - 25.0).abs() < 1e-9);
        assert!((m.src_width - 50.0).abs() < 1e-9);
        assert_eq!((m.dst_x, m.dst_width), (0, 100));
    }

    #[test]
    fn pan_shifts_visible_source_opposite() {
        let centered = view_mapping(100, 100, 100, 100, 2.0, (0.0, 0.0)).unwrap();
        let panned = view_mapping(100, 100, 100, 100, 2.0, (20.0, 0.0)).unwrap();
        // Panning the page right reveals source further to the left.
        assert!(panned.src_left < centered.src_left);
        assert!((centered.src_left - panned.src_left - 10.0).abs() < 1e-9);
    }

    #[test]
    fn page_panned_fully_off_surface_maps_to_nothing() {
        assert!(view_mapping(100, 100, 100, 100, 1.0, (500.0, 0.0)).is_none());
    }

    #[test]
    fn half_block_output_carries_pixel_colors() {
        // 2x4 bitmap (white over black, twice) on an exactly matching
        // 2-column, 2-row cell area.
        let mut pixels = Vec::new();
        for y in 0..4 {
            for _x in 0..2 {
                if y % 2 == 0 {
                    pixels.extend_from_slice(&[255, 255, 255]);
                } else {
                    pixels.extend_from_slice(&[0, 0, 0]);
                }
            }
        }
        let bitmap = PageBitmap {
            pixels,
            width: 2,
            height: 4,
        };

        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        PageView::new(&bitmap).render(area, &mut buf);

        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.symbol(), "\u{2580}");
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 0));
    }
}
