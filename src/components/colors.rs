use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, TextureOptions, Vec2};
use image::{Rgba, RgbaImage};

use crate::components::backdrop::{draw_checkerboard, to_color_image};
use crate::components::tools::{PointerEvent, PointerTracker};

/// Default edge length of the picker surface, in pixels.
pub const PICKER_SIZE: u32 = 256;

/// Largest picker surface accepted by [`PickerSurface::new`].
pub const PICKER_MAX_SIZE: u32 = 400;

// ============================================================================
// Picker surface
// ============================================================================

/// Fixed-size RGBA surface behind the picker.  Its coordinate space is its
/// own; it has nothing to do with the grid's scale.
pub struct PickerSurface {
    pixels: RgbaImage,
}

impl PickerSurface {
    /// Dimensions are clamped to `1..=PICKER_MAX_SIZE`.
    pub fn new(width: u32, height: u32) -> Self {
        let clamp = |v: u32| v.clamp(1, PICKER_MAX_SIZE);
        Self {
            pixels: RgbaImage::new(clamp(width), clamp(height)),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.pixels.get_pixel(x, y))
    }
}

// ============================================================================
// Colour sampling
// ============================================================================

/// Turns a marker position on the picker into a colour for the painter.
pub trait ColorSampler {
    fn selected_color(&self, picker: &PickerSurface, x: u32, y: u32) -> Option<Rgba<u8>>;
}

/// Sampler installed by default: the picker is not connected to the
/// painter, so nothing is ever selected.
pub struct UnwiredSampler;

impl ColorSampler for UnwiredSampler {
    fn selected_color(&self, _picker: &PickerSurface, _x: u32, _y: u32) -> Option<Rgba<u8>> {
        None
    }
}

// ============================================================================
// ColorPicker: marker + its own pointer handling
// ============================================================================

pub struct ColorPicker {
    surface: PickerSurface,
    marker: Pos2,
    pointer_held: bool,
    sampler: Box<dyn ColorSampler>,
    pointer: PointerTracker,
    texture: Option<egui::TextureHandle>,
}

impl Default for ColorPicker {
    fn default() -> Self {
        Self::new(PICKER_SIZE)
    }
}

impl ColorPicker {
    pub fn new(size: u32) -> Self {
        Self {
            surface: PickerSurface::new(size, size),
            marker: Pos2::ZERO,
            pointer_held: false,
            sampler: Box::new(UnwiredSampler),
            pointer: PointerTracker::default(),
            texture: None,
        }
    }

    pub fn with_sampler(mut self, sampler: Box<dyn ColorSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn marker_position(&self) -> Pos2 {
        self.marker
    }

    pub fn is_pointer_held(&self) -> bool {
        self.pointer_held
    }

    /// Same pointer-held rules as the grid: down grabs and moves the
    /// marker, move only while held, up/leave releases.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(offset) => {
                self.pointer_held = true;
                self.move_marker(offset);
            }
            PointerEvent::Move(offset) => {
                if self.pointer_held {
                    self.move_marker(offset);
                }
            }
            PointerEvent::Up | PointerEvent::Leave => self.pointer_held = false,
        }
    }

    /// Colour under the marker according to the installed sampler.
    pub fn selected_color(&self) -> Option<Rgba<u8>> {
        let x = (self.marker.x as u32).min(self.surface.width() - 1);
        let y = (self.marker.y as u32).min(self.surface.height() - 1);
        self.sampler.selected_color(&self.surface, x, y)
    }

    fn move_marker(&mut self, offset: Vec2) {
        let clamped = offset.clamp(Vec2::ZERO, self.surface.size());
        self.marker = Pos2::ZERO + clamped;
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let (rect, _response) =
            ui.allocate_exact_size(self.surface.size(), egui::Sense::click_and_drag());

        for event in self.pointer.poll(ui, rect) {
            self.handle_pointer(event);
        }

        if !ui.is_rect_visible(rect) {
            return;
        }
        if self.texture.is_none() {
            let image = to_color_image(self.surface.pixels());
            self.texture = Some(ui.ctx().load_texture("color_picker", image, TextureOptions::NEAREST));
        }

        let painter = ui.painter_at(rect);
        draw_checkerboard(&painter, rect, 8.0);
        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }

        let marker = rect.min + self.marker.to_vec2();
        painter.circle_stroke(marker, 6.0, Stroke::new(2.5, Color32::BLACK));
        painter.circle_stroke(marker, 6.0, Stroke::new(1.0, Color32::WHITE));
    }
}
