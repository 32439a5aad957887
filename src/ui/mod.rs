//! Configuration surface.
//!
//! The window owns all profile writes: edits land in the [`ProfileEditor`]'s
//! working copy and are published to the shared portal once per frame, so a
//! live mapping run never sees a half-edited profile. The mapping runtime is
//! driven through its handle and reports back over the status channel only.

pub mod common;
pub mod editor;

use crate::config::AppConfig;
use crate::input::GlobalHook;
use crate::mapper::{MapperHandle, MapperStatus};
use crate::pad::XPadConfig;
use crate::profile::{self, Profile, ProfilePortal};
use common::UiColors;
use eframe::egui::{self, ScrollArea, TextEdit};
use editor::ProfileEditor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct PadbridgeUI {
    editor: ProfileEditor,
    portal: Arc<ProfilePortal>,
    handle: MapperHandle,
    app_config: AppConfig,
    profile_path: String,
    notice: Option<String>,
}

impl PadbridgeUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        portal: Arc<ProfilePortal>,
        handle: MapperHandle,
        app_config: AppConfig,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        let profile = portal.snapshot().unwrap_or_else(|e| {
            warn!("could not read initial profile: {e}");
            Profile::default()
        });
        let profile_path = app_config.profile_path.display().to_string();
        PadbridgeUI {
            editor: ProfileEditor::new(profile),
            portal,
            handle,
            app_config,
            profile_path,
            notice: None,
        }
    }

    fn publish_edits(&mut self) {
        if self.editor.take_dirty() {
            if let Err(e) = self.portal.replace(self.editor.profile().clone()) {
                warn!("profile update not published: {e}");
            }
        }
    }

    fn save_profile(&mut self) {
        let path = PathBuf::from(&self.profile_path);
        match profile::save_profile(&path, self.editor.profile()) {
            Ok(()) => {
                self.notice = Some(format!("Saved: {}", path.display()));
                self.remember_profile_path(path);
            }
            Err(e) => self.notice = Some(format!("Save failed: {e}")),
        }
    }

    fn load_profile(&mut self) {
        let path = PathBuf::from(&self.profile_path);
        match profile::load_profile(&path) {
            Ok(profile) => {
                self.editor.set_profile(profile);
                self.notice = Some(format!("Loaded: {}", path.display()));
                self.remember_profile_path(path);
            }
            Err(e) => self.notice = Some(format!("Load failed: {e}")),
        }
    }

    fn remember_profile_path(&mut self, path: PathBuf) {
        self.app_config.profile_path = path;
        if let Err(e) = self.app_config.save() {
            warn!("could not persist application config: {e}");
        }
    }

    fn render_profile_io(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add(
                TextEdit::singleline(&mut self.profile_path)
                    .hint_text("profile path")
                    .desired_width(320.0),
            );
            if ui.button("Load Profile").clicked() {
                self.load_profile();
            }
            if ui.button("Save Profile").clicked() {
                self.save_profile();
            }
            if ui.button("Reset Defaults").clicked() {
                self.editor.set_profile(Profile::default());
                self.notice = Some("Reset to defaults".to_string());
            }
        });
    }

    fn render_runtime_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Start Mapper").clicked() {
                self.handle
                    .start(Box::new(XPadConfig), Box::new(GlobalHook));
                self.notice = None;
            }
            if ui.button("Stop Mapper").clicked() {
                self.handle.stop();
            }

            let status = self.handle.status();
            let color = match status {
                MapperStatus::Running => UiColors::ACTIVE,
                MapperStatus::Error(_) => UiColors::INACTIVE,
                _ => UiColors::HINT,
            };
            ui.colored_label(color, status.to_string());

            if let Some(notice) = &self.notice {
                ui.label(notice.clone());
            }
        });
    }
}

impl eframe::App for PadbridgeUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.editor.poll_capture();
        self.publish_edits();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.ctx().request_repaint_after(Duration::from_millis(33));

            egui::TopBottomPanel::top("profile_io")
                .show_separator_line(false)
                .show_inside(ui, |ui| self.render_profile_io(ui));

            egui::TopBottomPanel::bottom("runtime_controls")
                .show_separator_line(false)
                .show_inside(ui, |ui| self.render_runtime_controls(ui));

            egui::CentralPanel::default().show_inside(ui, |ui| {
                ScrollArea::vertical().show(ui, |ui| self.editor.render(ui));
            });
        });
    }
}
