use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, TextureOptions, Vec2};
use image::{Rgba, RgbaImage};

use crate::components::backdrop::{draw_checkerboard, to_color_image};
use crate::components::tools::{PointerEvent, PointerTracker, Tool, ToolState};

/// Logical grid edge length used when nothing else is configured.
pub const DEFAULT_GRID_SIZE: u32 = 16;

/// Share of the smaller viewport edge the presented grid occupies.
pub const VIEWPORT_FRACTION: f64 = 0.8;

pub const TRANSPARENT_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Opaque black, the only colour the base tool set paints with.
pub const DEFAULT_FOREGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

// ============================================================================
// COORDINATE MAPPING
// ============================================================================

/// Index of the cell containing `offset` along one axis, `floor(offset / scale)`.
///
/// No clamping: offsets at or past the far edge map past the last cell and
/// the painter ignores them.
#[inline]
pub fn map_to_cell(offset: f32, scale: f32) -> i32 {
    (offset as f64 / scale as f64).floor() as i32
}

/// [`map_to_cell`] on both axes.
#[inline]
pub fn map_to_cell_pos(offset: Vec2, scale: f32) -> (i32, i32) {
    (map_to_cell(offset.x, scale), map_to_cell(offset.y, scale))
}

// ============================================================================
// GRID SURFACE
// ============================================================================

/// Fixed-resolution RGBA backing buffer plus the size it is presented at.
///
/// The logical resolution is set once in [`GridSurface::new`]; resizing the
/// window only ever changes `presentation_size`.
pub struct GridSurface {
    pixels: RgbaImage,
    presentation_size: u32,
    dirty: bool,
}

impl GridSurface {
    /// Create a fully transparent surface.  Zero dimensions are bumped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
            presentation_size: 0,
            dirty: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn presentation_size(&self) -> u32 {
        self.presentation_size
    }

    /// Presentation layer only; the backing buffer is left alone so painted
    /// cells survive a resize.
    pub fn set_presentation_size(&mut self, size: u32) {
        self.presentation_size = size;
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        let (x, y) = self.in_bounds(x, y)?;
        Some(*self.pixels.get_pixel(x, y))
    }

    pub fn is_painted(&self, x: i32, y: i32) -> bool {
        self.pixel(x, y).is_some_and(|p| p[3] != 0)
    }

    /// Fill (`Tool::Paint`) or clear (`Tool::Erase`) the single cell at
    /// `(x, y)`.  Cells outside the grid are ignored.
    pub fn paint_cell(&mut self, x: i32, y: i32, tool: Tool, foreground: Rgba<u8>) {
        let Some((x, y)) = self.in_bounds(x, y) else { return };
        let value = match tool {
            Tool::Paint => foreground,
            Tool::Erase => TRANSPARENT_PIXEL,
        };
        let pixel = self.pixels.get_pixel_mut(x, y);
        if *pixel != value {
            *pixel = value;
            self.dirty = true;
        }
    }

    /// Clear every cell to transparent.
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = TRANSPARENT_PIXEL;
        }
        self.dirty = true;
    }

    /// True once after any change to the buffer (used for texture re-upload).
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn in_bounds(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        (x < self.width() && y < self.height()).then_some((x, y))
    }
}

// ============================================================================
// SCALING
// ============================================================================

/// Display size of the grid and the presentation pixels per logical cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Presentation {
    pub size: u32,
    pub scale: f32,
}

/// `size = floor(0.8 * min(w, h))`, `scale = size / logical_dim`.
pub fn recompute_scale(viewport_width: f32, viewport_height: f32, logical_dim: u32) -> Presentation {
    let shorter = viewport_width.min(viewport_height).max(0.0) as f64;
    let size = (VIEWPORT_FRACTION * shorter).floor() as u32;
    Presentation {
        size,
        scale: size as f32 / logical_dim.max(1) as f32,
    }
}

/// Recomputes the presentation on mount and whenever the viewport changes.
#[derive(Clone, Copy, Debug)]
pub struct ScalingController {
    last_viewport: Option<(f32, f32)>,
    current: Presentation,
}

impl Default for ScalingController {
    fn default() -> Self {
        Self {
            last_viewport: None,
            current: Presentation { size: 0, scale: 1.0 },
        }
    }
}

impl ScalingController {
    pub fn presentation(&self) -> Presentation {
        self.current
    }

    /// Feed the current viewport.  Returns the new presentation on the first
    /// call and on every call whose viewport differs from the previous one.
    ///
    /// An empty viewport keeps the previous scale so mapping never divides
    /// by zero.
    pub fn observe_viewport(&mut self, width: f32, height: f32, logical_dim: u32) -> Option<Presentation> {
        if self.last_viewport == Some((width, height)) {
            return None;
        }
        self.last_viewport = Some((width, height));

        let next = recompute_scale(width, height, logical_dim);
        self.current = if next.size == 0 {
            Presentation { size: 0, scale: self.current.scale }
        } else {
            next
        };
        Some(self.current)
    }
}

// ============================================================================
// CANVAS STATE
// ============================================================================

/// Everything the drawing area owns: the (lazily created) surface, the
/// scaling controller and the foreground colour.
pub struct CanvasState {
    surface: Option<GridSurface>,
    grid_size: u32,
    pub foreground: Rgba<u8>,
    scaling: ScalingController,
}

impl CanvasState {
    /// No surface exists until [`CanvasState::create_surface`] runs.
    pub fn new(grid_size: u32) -> Self {
        Self {
            surface: None,
            grid_size: grid_size.max(1),
            foreground: DEFAULT_FOREGROUND,
            scaling: ScalingController::default(),
        }
    }

    /// Create the surface if it does not exist yet.  Calling it again keeps
    /// the existing pixels.
    pub fn create_surface(&mut self) -> &mut GridSurface {
        let presentation = self.scaling.presentation();
        let grid_size = self.grid_size;
        self.surface.get_or_insert_with(|| {
            crate::log_info!("Created {}×{} grid surface", grid_size, grid_size);
            let mut surface = GridSurface::new(grid_size, grid_size);
            surface.set_presentation_size(presentation.size);
            surface
        })
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&GridSurface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut GridSurface> {
        self.surface.as_mut()
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn scale_factor(&self) -> f32 {
        self.scaling.presentation().scale
    }

    pub fn presentation_size(&self) -> u32 {
        self.scaling.presentation().size
    }

    /// Run the scaling controller and push a changed presentation size onto
    /// the surface.
    pub fn observe_viewport(&mut self, width: f32, height: f32) -> Option<Presentation> {
        let changed = self.scaling.observe_viewport(width, height, self.grid_size)?;
        crate::log_info!(
            "Viewport {}×{} → presentation {}px, scale {:.3}",
            width,
            height,
            changed.size,
            changed.scale
        );
        if let Some(surface) = self.surface.as_mut() {
            surface.set_presentation_size(changed.size);
        }
        Some(changed)
    }

    /// Apply `tool` at cell `(x, y)` with the current foreground.
    pub fn paint_cell(&mut self, x: i32, y: i32, tool: Tool) {
        let foreground = self.foreground;
        if let Some(surface) = self.surface.as_mut() {
            surface.paint_cell(x, y, tool, foreground);
        }
    }

    /// Route a pointer event through the tool state; paints or erases when
    /// the state machine asks for it.  The tool is read at invocation time.
    pub fn handle_pointer(&mut self, tools: &mut ToolState, event: PointerEvent) {
        let Some(offset) = tools.handle(event) else { return };
        if self.presentation_size() == 0 {
            return;
        }
        let (x, y) = map_to_cell_pos(offset, self.scale_factor());
        self.paint_cell(x, y, tools.tool());
    }

    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
            crate::log_info!("Canvas cleared");
        }
    }

    /// PNG bytes of the logical buffer, or `None` when there is no surface
    /// yet (or encoding failed).
    pub fn export_png(&self) -> Option<Vec<u8>> {
        let surface = self.surface.as_ref()?;
        match crate::io::encode_png(surface.pixels()) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                crate::log_err!("PNG encoding failed: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// CANVAS WIDGET
// ============================================================================

pub struct Canvas {
    texture: Option<egui::TextureHandle>,
    pointer: PointerTracker,
    pub show_grid_lines: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            texture: None,
            pointer: PointerTracker::default(),
            show_grid_lines: true,
        }
    }

    /// Lay out the grid in the remaining space of `ui`, feed pointer input
    /// into `state` and draw it.  The first call creates the surface.
    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut CanvasState, tools: &mut ToolState) {
        let available = ui.available_size();
        state.observe_viewport(available.x, available.y);
        state.create_surface();

        let (response, painter) = ui.allocate_painter(available, egui::Sense::click_and_drag());
        let size = state.presentation_size() as f32;
        let image_rect = Rect::from_center_size(response.rect.center(), Vec2::splat(size));

        for event in self.pointer.poll(ui, image_rect) {
            state.handle_pointer(tools, event);
        }

        if size <= 0.0 {
            return;
        }
        let Some(surface) = state.surface_mut() else { return };
        self.sync_texture(ui.ctx(), surface);

        draw_checkerboard(&painter, image_rect, (state.scale_factor() * 0.5).max(2.0));
        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), image_rect, uv, Color32::WHITE);
        }
        if self.show_grid_lines {
            draw_grid_lines(&painter, image_rect, state.grid_size(), state.scale_factor());
        }
        painter.rect_stroke(image_rect, 0.0, Stroke::new(1.0, Color32::from_gray(90)));
    }

    fn sync_texture(&mut self, ctx: &egui::Context, surface: &mut GridSurface) {
        if !surface.take_dirty() && self.texture.is_some() {
            return;
        }
        let image = to_color_image(surface.pixels());
        match self.texture.as_mut() {
            Some(tex) => tex.set(image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("pixel_grid", image, TextureOptions::NEAREST));
            }
        }
    }
}

fn draw_grid_lines(painter: &egui::Painter, rect: Rect, cells: u32, scale: f32) {
    // Lines would swamp the cells below this size.
    if scale < 6.0 {
        return;
    }
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(120, 140, 200, 90));
    for i in 1..cells {
        let d = i as f32 * scale;
        painter.line_segment(
            [Pos2::new(rect.min.x + d, rect.min.y), Pos2::new(rect.min.x + d, rect.max.y)],
            stroke,
        );
        painter.line_segment(
            [Pos2::new(rect.min.x, rect.min.y + d), Pos2::new(rect.max.x, rect.min.y + d)],
            stroke,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_surface(viewport: (f32, f32)) -> CanvasState {
        let mut state = CanvasState::new(DEFAULT_GRID_SIZE);
        state.observe_viewport(viewport.0, viewport.1);
        state.create_surface();
        state
    }

    #[test]
    fn mapping_is_floor_of_ratio() {
        assert_eq!(map_to_cell(0.0, 40.0), 0);
        assert_eq!(map_to_cell(39.5, 40.0), 0);
        assert_eq!(map_to_cell(40.0, 40.0), 1);
        assert_eq!(map_to_cell(639.0, 40.0), 15);
        assert_eq!(map_to_cell(7.5, 2.5), 3);
    }

    #[test]
    fn mapping_lands_in_containing_interval() {
        for &scale in &[0.75_f32, 1.0, 12.5, 25.0, 40.0, 37.3] {
            let mut p = 0.0_f32;
            while p < 700.0 {
                let c = map_to_cell(p, scale) as f64;
                let (p64, s64) = (p as f64, scale as f64);
                assert!(c * s64 <= p64, "p={p} s={scale} c={c}");
                assert!(p64 < (c + 1.0) * s64, "p={p} s={scale} c={c}");
                p += 3.7;
            }
        }
    }

    #[test]
    fn mapping_past_edge_is_not_clamped() {
        assert_eq!(map_to_cell(640.0, 40.0), 16);
        assert_eq!(map_to_cell(-0.5, 40.0), -1);
    }

    #[test]
    fn paint_is_idempotent() {
        let mut once = GridSurface::new(16, 16);
        once.paint_cell(4, 7, Tool::Paint, DEFAULT_FOREGROUND);
        let mut twice = GridSurface::new(16, 16);
        twice.paint_cell(4, 7, Tool::Paint, DEFAULT_FOREGROUND);
        twice.paint_cell(4, 7, Tool::Paint, DEFAULT_FOREGROUND);
        assert_eq!(once.pixels().as_raw(), twice.pixels().as_raw());
        assert_eq!(once.pixel(4, 7), Some(DEFAULT_FOREGROUND));
    }

    #[test]
    fn erase_undoes_paint_on_clean_surface() {
        let mut surface = GridSurface::new(16, 16);
        let blank = surface.pixels().clone();
        surface.paint_cell(9, 2, Tool::Paint, DEFAULT_FOREGROUND);
        assert!(surface.is_painted(9, 2));
        surface.paint_cell(9, 2, Tool::Erase, DEFAULT_FOREGROUND);
        assert_eq!(surface.pixels().as_raw(), blank.as_raw());
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut surface = GridSurface::new(16, 16);
        let blank = surface.pixels().clone();
        for (x, y) in [(-1, 0), (0, -1), (16, 0), (0, 16), (i32::MAX, i32::MIN)] {
            surface.paint_cell(x, y, Tool::Paint, DEFAULT_FOREGROUND);
        }
        assert_eq!(surface.pixels().as_raw(), blank.as_raw());
        assert_eq!(surface.pixel(16, 3), None);
    }

    #[test]
    fn dirty_flag_tracks_real_changes() {
        let mut surface = GridSurface::new(4, 4);
        assert!(surface.take_dirty());
        surface.paint_cell(1, 1, Tool::Erase, DEFAULT_FOREGROUND);
        assert!(!surface.take_dirty());
        surface.paint_cell(1, 1, Tool::Paint, DEFAULT_FOREGROUND);
        assert!(surface.take_dirty());
        assert!(!surface.take_dirty());
    }

    #[test]
    fn scale_uses_shorter_edge() {
        assert_eq!(recompute_scale(1000.0, 800.0, 16), Presentation { size: 640, scale: 40.0 });
        assert_eq!(recompute_scale(500.0, 900.0, 16), Presentation { size: 400, scale: 25.0 });
        assert_eq!(recompute_scale(333.0, 333.0, 16).size, 266);
    }

    #[test]
    fn controller_fires_on_mount_and_changes_only() {
        let mut scaling = ScalingController::default();
        assert!(scaling.observe_viewport(1000.0, 800.0, 16).is_some());
        assert!(scaling.observe_viewport(1000.0, 800.0, 16).is_none());
        let p = scaling.observe_viewport(1200.0, 800.0, 16);
        assert_eq!(p, Some(Presentation { size: 640, scale: 40.0 }));
    }

    #[test]
    fn empty_viewport_keeps_previous_scale() {
        let mut scaling = ScalingController::default();
        scaling.observe_viewport(1000.0, 800.0, 16);
        let p = scaling.observe_viewport(0.0, 800.0, 16).unwrap();
        assert_eq!(p.size, 0);
        assert_eq!(p.scale, 40.0);
    }

    #[test]
    fn resize_keeps_painted_cells() {
        let mut state = state_with_surface((1000.0, 800.0));
        state.paint_cell(3, 5, Tool::Paint);
        state.observe_viewport(500.0, 900.0);

        let surface = state.surface().unwrap();
        assert!(surface.is_painted(3, 5));
        assert_eq!((surface.width(), surface.height()), (16, 16));
        assert_eq!(surface.presentation_size(), 400);
        assert_eq!(state.scale_factor(), 400.0 / 16.0);
    }

    #[test]
    fn pointer_gesture_paints_mapped_cells() {
        let mut state = state_with_surface((1000.0, 800.0));
        let mut tools = ToolState::new();
        state.handle_pointer(&mut tools, PointerEvent::Down(Vec2::new(125.0, 205.0)));
        state.handle_pointer(&mut tools, PointerEvent::Move(Vec2::new(165.0, 205.0)));
        state.handle_pointer(&mut tools, PointerEvent::Up);
        state.handle_pointer(&mut tools, PointerEvent::Move(Vec2::new(205.0, 205.0)));

        let surface = state.surface().unwrap();
        assert!(surface.is_painted(3, 5));
        assert!(surface.is_painted(4, 5));
        assert!(!surface.is_painted(5, 5));
    }

    #[test]
    fn fast_drag_paints_every_crossed_cell() {
        let mut state = state_with_surface((1000.0, 800.0));
        let mut tools = ToolState::new();
        let mut tracker = PointerTracker::default();
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::splat(640.0));
        let button = |x: f32, pressed: bool| egui::Event::PointerButton {
            pos: Pos2::new(x, 5.0),
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::default(),
        };

        let frames = [
            vec![button(5.0, true)],
            vec![
                egui::Event::PointerMoved(Pos2::new(45.0, 5.0)),
                egui::Event::PointerMoved(Pos2::new(85.0, 5.0)),
                egui::Event::PointerMoved(Pos2::new(125.0, 5.0)),
            ],
            vec![button(125.0, false)],
        ];
        for frame in &frames {
            for event in tracker.translate(frame, rect) {
                state.handle_pointer(&mut tools, event);
            }
        }

        let surface = state.surface().unwrap();
        let painted: Vec<i32> = (0..16).filter(|&x| surface.is_painted(x, 0)).collect();
        assert_eq!(painted, vec![0, 1, 2, 3]);
        assert!(!tools.is_pointer_held());
    }

    #[test]
    fn switching_to_erase_mid_gesture_erases_next_cell() {
        let mut state = state_with_surface((1000.0, 800.0));
        state.paint_cell(6, 0, Tool::Paint);
        let mut tools = ToolState::new();

        state.handle_pointer(&mut tools, PointerEvent::Down(Vec2::new(205.0, 5.0)));
        assert!(state.surface().unwrap().is_painted(5, 0));

        tools.select_tool(Tool::Erase);
        state.handle_pointer(&mut tools, PointerEvent::Move(Vec2::new(245.0, 5.0)));
        let surface = state.surface().unwrap();
        assert!(!surface.is_painted(6, 0));
        assert!(surface.is_painted(5, 0));
    }

    #[test]
    fn edge_pointer_is_clipped_silently() {
        let mut state = state_with_surface((1000.0, 800.0));
        let mut tools = ToolState::new();
        state.handle_pointer(&mut tools, PointerEvent::Down(Vec2::new(640.0, 640.0)));
        let surface = state.surface().unwrap();
        assert!(surface.pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn operations_without_surface_are_noops() {
        let mut state = CanvasState::new(16);
        let mut tools = ToolState::new();
        state.observe_viewport(1000.0, 800.0);
        state.handle_pointer(&mut tools, PointerEvent::Down(Vec2::new(10.0, 10.0)));
        state.paint_cell(0, 0, Tool::Paint);
        state.clear();
        assert!(!state.has_surface());
        assert!(state.export_png().is_none());
        assert!(tools.is_pointer_held());
    }

    #[test]
    fn surface_created_late_picks_up_presentation() {
        let mut state = CanvasState::new(16);
        state.observe_viewport(1000.0, 800.0);
        assert_eq!(state.create_surface().presentation_size(), 640);
    }

    #[test]
    fn create_surface_twice_keeps_pixels() {
        let mut state = state_with_surface((1000.0, 800.0));
        state.paint_cell(1, 1, Tool::Paint);
        state.create_surface();
        assert!(state.surface().unwrap().is_painted(1, 1));
    }

    #[test]
    fn clear_then_export_is_fully_transparent() {
        let mut state = state_with_surface((1000.0, 800.0));
        state.paint_cell(0, 0, Tool::Paint);
        state.paint_cell(15, 15, Tool::Paint);
        state.clear();

        let bytes = state.export_png().expect("surface exists");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert!(decoded.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn export_has_logical_resolution_and_content() {
        let mut state = state_with_surface((1000.0, 800.0));
        state.paint_cell(2, 3, Tool::Paint);
        let bytes = state.export_png().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(*decoded.get_pixel(2, 3), DEFAULT_FOREGROUND);
        assert_eq!(*decoded.get_pixel(3, 2), TRANSPARENT_PIXEL);
    }
}
