//! Profile editor: one row per control, capture-driven binding.

use super::common::{section_frame, UiColors};
use crate::input::{hook, PhysicalKey};
use crate::profile::{KeySlot, Profile};
use eframe::egui::{DragValue, Grid, Ui};
use tokio::sync::oneshot;
use tracing::warn;

const BUTTON_CONTROLS: [&str; 14] = [
    "A", "B", "X", "Y", "LB", "RB", "BACK", "START", "LS_CLICK", "RS_CLICK", "DPAD_UP",
    "DPAD_DOWN", "DPAD_LEFT", "DPAD_RIGHT",
];
const LEFT_STICK_CONTROLS: [&str; 4] = [
    "LEFT_STICK_UP",
    "LEFT_STICK_DOWN",
    "LEFT_STICK_LEFT",
    "LEFT_STICK_RIGHT",
];
const RIGHT_STICK_CONTROLS: [&str; 4] = [
    "RIGHT_STICK_UP",
    "RIGHT_STICK_DOWN",
    "RIGHT_STICK_LEFT",
    "RIGHT_STICK_RIGHT",
];
const TRIGGER_CONTROLS: [&str; 2] = ["LT", "RT"];
const EXIT_CONTROLS: [&str; 2] = ["EXIT_KEY_1", "EXIT_KEY_2"];

/// A pending "press a key" request for one row.
struct Capture {
    field: &'static str,
    rx: oneshot::Receiver<PhysicalKey>,
}

/// Working copy of the profile being edited.
///
/// Edits mark the editor dirty; the application pushes the working copy into
/// the portal once per frame so a live mapping run picks changes up within
/// one cycle.
pub struct ProfileEditor {
    profile: Profile,
    capture: Option<Capture>,
    dirty: bool,
}

impl ProfileEditor {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            capture: None,
            dirty: false,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Replaces the working copy, e.g. after loading a document.
    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
        self.capture = None;
        self.dirty = true;
    }

    /// Whether edits happened since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Resolves a pending capture. Called once per frame.
    pub fn poll_capture(&mut self) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };
        match capture.rx.try_recv() {
            Ok(key) => {
                let field = capture.field;
                self.capture = None;
                self.with_slot(field, |slot| slot.set(key));
                self.dirty = true;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => self.capture = None,
        }
    }

    pub fn render(&mut self, ui: &mut Ui) {
        self.render_binding_section(ui, "Buttons", &BUTTON_CONTROLS);
        self.render_binding_section(ui, "Left Stick (4-direction keys)", &LEFT_STICK_CONTROLS);
        self.render_binding_section(ui, "Right Stick (4-direction keys)", &RIGHT_STICK_CONTROLS);
        self.render_binding_section(ui, "Triggers (full press while held)", &TRIGGER_CONTROLS);
        self.render_binding_section(ui, "Exit Combo", &EXIT_CONTROLS);
        self.render_settings_section(ui);
    }

    fn render_binding_section(&mut self, ui: &mut Ui, title: &str, controls: &[&'static str]) {
        section_frame().show(ui, |ui| {
            ui.vertical(|ui| {
                ui.heading(title);
                Grid::new(title).num_columns(4).striped(true).show(ui, |ui| {
                    for &control in controls {
                        self.render_binding_row(ui, control);
                    }
                });
            });
        });
    }

    fn render_binding_row(&mut self, ui: &mut Ui, field: &'static str) {
        let capturing = self.capture.as_ref().map(|c| c.field == field).unwrap_or(false);
        let label = self.slot_label(field);

        ui.label(field);
        if capturing {
            ui.colored_label(UiColors::ACTIVE, "press a key ...");
        } else {
            ui.colored_label(UiColors::HINT, label);
        }
        if ui.button("Set").clicked() {
            self.begin_capture(field);
        }
        if ui.button("Clear").clicked() {
            self.with_slot(field, |slot| slot.clear());
            self.dirty = true;
            if capturing {
                self.capture = None;
                hook::cancel_capture();
            }
        }
        ui.end_row();
    }

    fn render_settings_section(&mut self, ui: &mut Ui) {
        section_frame().show(ui, |ui| {
            ui.vertical(|ui| {
                ui.heading("Settings");
                ui.horizontal(|ui| {
                    ui.label("Stick Magnitude (0.0 - 1.0):");
                    if ui
                        .add(
                            DragValue::new(&mut self.profile.stick_magnitude)
                                .speed(0.1)
                                .range(0.0..=1.0),
                        )
                        .changed()
                    {
                        self.dirty = true;
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Exit Hold (sec):");
                    if ui
                        .add(
                            DragValue::new(&mut self.profile.exit_hold_secs)
                                .speed(0.1)
                                .range(0.0..=5.0),
                        )
                        .changed()
                    {
                        self.dirty = true;
                    }
                });
            });
        });
    }

    fn begin_capture(&mut self, field: &'static str) {
        match hook::capture_next_key() {
            Ok(rx) => self.capture = Some(Capture { field, rx }),
            Err(e) => warn!("key capture unavailable: {e}"),
        }
    }

    fn slot_label(&self, field: &str) -> String {
        self.profile
            .slots()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, slot)| slot.label())
            .unwrap_or_default()
    }

    fn with_slot(&mut self, field: &str, edit: impl FnOnce(&mut KeySlot)) {
        if let Some((_, slot)) = self
            .profile
            .slots_mut()
            .into_iter()
            .find(|(name, _)| *name == field)
        {
            edit(slot);
        }
    }
}
