use crate::canvas::{Canvas, CanvasState};
use crate::components::colors::ColorPicker;
use crate::components::tools::{SidebarAction, ToolsPanel};
use crate::io::FileHandler;
use crate::settings::AppSettings;
use eframe::egui;

/// Top-level component.  Owns every piece of mutable state; child widgets
/// get borrows and report back through return values.
pub struct PixelGridApp {
    canvas_state: CanvasState,
    canvas: Canvas,
    tools_panel: ToolsPanel,
    color_picker: ColorPicker,
    file_handler: FileHandler,
    settings: AppSettings,
    status: Option<String>,
}

impl PixelGridApp {
    /// `grid_size` is the size for this session; it may differ from the saved
    /// one and is never written back.
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: AppSettings, grid_size: u32) -> Self {
        let mut canvas = Canvas::new();
        canvas.show_grid_lines = settings.show_grid_lines;
        Self {
            canvas_state: CanvasState::new(grid_size),
            canvas,
            tools_panel: ToolsPanel::new(),
            color_picker: ColorPicker::default(),
            file_handler: FileHandler::new(settings.last_export_dir.clone()),
            settings,
            status: None,
        }
    }

    fn handle_sidebar(&mut self, action: SidebarAction) {
        match action {
            SidebarAction::Clear => {
                self.canvas_state.clear();
                self.status = None;
            }
            SidebarAction::Export => self.export_png(),
        }
    }

    fn export_png(&mut self) {
        let Some(bytes) = self.canvas_state.export_png() else {
            crate::log_warn!("Export requested before the surface exists");
            self.status = Some("Export unavailable".to_string());
            return;
        };
        match self.file_handler.export(&bytes) {
            Ok(Some(path)) => {
                self.status = Some(format!("Saved {}", path.display()));
                self.settings.last_export_dir = self.file_handler.last_export_dir.clone();
                self.settings.save();
            }
            Ok(None) => {}
            Err(e) => {
                crate::log_err!("{}", e);
                self.status = Some(e);
            }
        }
    }

    fn status_line(&self) -> String {
        let tool = self.tools_panel.state.tool().label();
        let size = self.canvas_state.grid_size();
        format!(
            "{}×{}  ·  scale {:.2}  ·  {}",
            size,
            size,
            self.canvas_state.scale_factor(),
            tool
        )
    }
}

impl eframe::App for PixelGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(150.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                let export_available = self.canvas_state.has_surface();
                if let Some(action) = self.tools_panel.show(ui, export_available) {
                    self.handle_sidebar(action);
                }
                ui.add_space(12.0);
                if ui.checkbox(&mut self.canvas.show_grid_lines, "Grid lines").changed() {
                    self.settings.show_grid_lines = self.canvas.show_grid_lines;
                    self.settings.save();
                }
            });

        egui::SidePanel::right("color_picker")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new("Colour").strong());
                ui.add_space(4.0);
                self.color_picker.show(ui);
                let marker = self.color_picker.marker_position();
                ui.label(format!("Marker: {:.0}, {:.0}", marker.x, marker.y));
                let selected = match self.color_picker.selected_color() {
                    Some(c) => format!("#{:02X}{:02X}{:02X}", c[0], c[1], c[2]),
                    None => "none".to_string(),
                };
                ui.label(format!("Selected: {}", selected));
            });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_line());
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas
                .show(ui, &mut self.canvas_state, &mut self.tools_panel.state);
        });
    }
}
