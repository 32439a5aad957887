//! Shared styling for the configuration surface.

use eframe::egui::{Color32, Frame, Stroke};

/// Dark theme palette used across the editor panels.
pub struct UiColors;

impl UiColors {
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Running / capture-armed indicator.
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Error indicator.
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);

    /// De-emphasized hints next to bindings.
    pub const HINT: Color32 = Color32::from_rgb(140, 140, 140);
}

/// One framed editor section, consistent across all panels.
pub fn section_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .fill(UiColors::MAIN_BG)
        .inner_margin(8)
        .outer_margin(2)
}
