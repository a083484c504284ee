use eframe::egui;
use egui::{Color32, Pos2, Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Paint,
    Erase,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Paint => "Brush",
            Tool::Erase => "Eraser",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Paint, Tool::Erase]
    }
}

/// Pointer input relative to the top-left corner of the surface that
/// received it, in presentation pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
    Leave,
}

// ============================================================================
// TOOL STATE: {Paint, Erase} × {pointer up, pointer down}
// ============================================================================

/// Active tool plus the pointer-held flag.  The two axes are independent:
/// selecting a tool never touches the held flag and vice versa.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToolState {
    tool: Tool,
    pointer_held: bool,
}

impl ToolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn is_pointer_held(&self) -> bool {
        self.pointer_held
    }

    /// Advance the pointer axis.  Returns the offset at which the active tool
    /// must be applied, if this event triggers an invocation.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Vec2> {
        match event {
            PointerEvent::Down(offset) => {
                self.pointer_held = true;
                Some(offset)
            }
            PointerEvent::Move(offset) => self.pointer_held.then_some(offset),
            PointerEvent::Up | PointerEvent::Leave => {
                self.pointer_held = false;
                None
            }
        }
    }
}

// ============================================================================
// POINTER TRACKING: egui input → PointerEvent
// ============================================================================

/// Turns egui's raw pointer events into down/move/up/leave events for one
/// rectangle on screen.  Every sub-frame `PointerMoved` is kept, in the
/// order the host delivered it.
#[derive(Default)]
pub struct PointerTracker {
    last_inside: Option<Pos2>,
}

impl PointerTracker {
    pub fn poll(&mut self, ui: &egui::Ui, rect: Rect) -> Vec<PointerEvent> {
        let raw: Vec<egui::Event> = ui.input(|i| {
            i.events
                .iter()
                .filter(|e| {
                    matches!(
                        e,
                        egui::Event::PointerMoved(_)
                            | egui::Event::PointerButton { .. }
                            | egui::Event::PointerGone
                    )
                })
                .cloned()
                .collect()
        });
        let mut events = self.translate(&raw, rect);

        // Another layer covering the rect takes the pointer without a move out of it.
        if self.last_inside.is_some() && !ui.rect_contains_pointer(rect) {
            self.last_inside = None;
            events.push(PointerEvent::Leave);
        }
        events
    }

    pub(crate) fn translate(&mut self, raw: &[egui::Event], rect: Rect) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        for event in raw {
            match *event {
                egui::Event::PointerMoved(pos) if rect.contains(pos) => {
                    if self.last_inside != Some(pos) {
                        events.push(PointerEvent::Move(pos - rect.min));
                    }
                    self.last_inside = Some(pos);
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } if rect.contains(pos) => {
                    events.push(if pressed {
                        PointerEvent::Down(pos - rect.min)
                    } else {
                        PointerEvent::Up
                    });
                    self.last_inside = Some(pos);
                }
                egui::Event::PointerMoved(_) | egui::Event::PointerGone => {
                    if self.last_inside.take().is_some() {
                        events.push(PointerEvent::Leave);
                    }
                }
                _ => {}
            }
        }
        events
    }
}

// ============================================================================
// SIDEBAR
// ============================================================================

/// Requests the sidebar makes of the owner of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SidebarAction {
    Clear,
    Export,
}

pub struct ToolsPanel {
    pub state: ToolState,
}

impl Default for ToolsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolsPanel {
    pub fn new() -> Self {
        Self {
            state: ToolState::new(),
        }
    }

    /// Draw the tool buttons plus the clear / export utilities.
    /// `export_available` greys out the export button until a surface exists.
    pub fn show(&mut self, ui: &mut egui::Ui, export_available: bool) -> Option<SidebarAction> {
        let mut action = None;

        ui.label(egui::RichText::new("Tools").strong());
        ui.add_space(4.0);
        for &tool in Tool::all() {
            let selected = self.state.tool() == tool;
            let size = Vec2::new(ui.available_width(), 28.0);
            if ui
                .add_sized(size, egui::SelectableLabel::new(selected, tool.label()))
                .clicked()
            {
                self.state.select_tool(tool);
            }
        }

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(4.0);

        let full_width = Vec2::new(ui.available_width(), 28.0);
        let clear = egui::Button::new(egui::RichText::new("Clear").color(Color32::WHITE))
            .fill(Color32::DARK_RED)
            .min_size(full_width);
        if ui.add(clear).clicked() {
            action = Some(SidebarAction::Clear);
        }

        let export = egui::Button::new(egui::RichText::new("Download as PNG").color(Color32::WHITE))
            .fill(Color32::DARK_GREEN)
            .min_size(full_width);
        if ui.add_enabled(export_available, export).clicked() {
            action = Some(SidebarAction::Export);
        }

        action
    }
}
