//! Annotation overlay. Purely visual: nothing here feeds labels or features.

use edgegrid_core::{Grid, LabelMatrix};
use edgegrid_stroke::StrokeHistory;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

pub const GRID_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const STROKE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const LABEL_TINT: Rgb<u8> = Rgb([255, 255, 0]);

/// Redraw the canvas with grid lines, optional label tint and stroke pixels.
///
/// Strokes are painted from the cached points of the history, so the
/// overlay always shows exactly what undo would remove.
pub fn preview(canvas: &RgbImage, grid: &Grid, history: &StrokeHistory, labels: Option<&LabelMatrix>) -> RgbImage {
    let mut out = canvas.clone();
    let s = grid.canvas_size() as f32;

    if let Some(labels) = labels {
        let mut tint = out.clone();
        for cell in labels.marked_cells() {
            let b = grid.bounds(cell);
            let rect = Rect::at(b.x0 as i32, b.y0 as i32).of_size(b.width() as u32, b.height() as u32);
            draw_filled_rect_mut(&mut tint, rect, LABEL_TINT);
        }
        blend(&mut out, &tint, 0.35);
    }

    for pos in grid.line_positions() {
        let p = pos as f32;
        draw_line_segment_mut(&mut out, (p, 0.0), (p, s - 1.0), GRID_COLOR);
        draw_line_segment_mut(&mut out, (0.0, p), (s - 1.0, p), GRID_COLOR);
    }

    let (w, h) = out.dimensions();
    for p in history.marked_points() {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
            out.put_pixel(p.x as u32, p.y as u32, STROKE_COLOR);
        }
    }
    out
}

fn blend(base: &mut RgbImage, overlay: &RgbImage, alpha: f32) {
    for (b, o) in base.pixels_mut().zip(overlay.pixels()) {
        for c in 0..3 {
            b.0[c] = (b.0[c] as f32 * (1.0 - alpha) + o.0[c] as f32 * alpha).round() as u8;
        }
    }
}
