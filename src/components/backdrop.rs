//! Drawing shared by the grid and the colour picker, both of which show
//! surfaces that may hold transparent pixels.

use eframe::egui;
use egui::{Color32, ColorImage, Painter, Rect, Vec2};
use image::RgbaImage;

const LIGHT_SQUARE: Color32 = Color32::WHITE;
const DARK_SQUARE: Color32 = Color32::from_gray(220);

/// The dark squares of a checkerboard with `cell`-sized squares anchored at
/// `rect.min`, clipped to `rect`.  The top-left square is light.
pub fn dark_squares(rect: Rect, cell: f32) -> Vec<Rect> {
    if cell <= 0.0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Vec::new();
    }
    let cols = (rect.width() / cell).ceil() as u32;
    let rows = (rect.height() / cell).ceil() as u32;
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .filter(|(row, col)| (row + col) % 2 == 1)
        .map(|(row, col)| {
            let min = rect.min + Vec2::new(col as f32, row as f32) * cell;
            Rect::from_min_size(min, Vec2::splat(cell)).intersect(rect)
        })
        .collect()
}

/// Paint the transparency backdrop behind a surface.
pub fn draw_checkerboard(painter: &Painter, rect: Rect, cell: f32) {
    painter.rect_filled(rect, 0.0, LIGHT_SQUARE);
    for square in dark_squares(rect, cell) {
        painter.rect_filled(square, 0.0, DARK_SQUARE);
    }
}

/// Upload format for an RGBA buffer (straight alpha).
pub fn to_color_image(img: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied([img.width() as usize, img.height() as usize], img.as_raw())
}
