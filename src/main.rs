pub mod config;
pub mod input;
pub mod mapper;
pub mod pad;
pub mod profile;
pub mod ui;

use crate::config::AppConfig;
use crate::input::KeyState;
use crate::mapper::MapperHandle;
use crate::profile::{Profile, ProfilePortal};
use crate::ui::PadbridgeUI;
use color_eyre::eyre::{eyre, Result};
use eframe::egui;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let app_config = AppConfig::load();
    info!(
        "Starting padbridge at {} Hz, profile {}",
        app_config.cycle_hz,
        app_config.profile_path.display()
    );

    let startup_profile = match profile::load_profile(&app_config.profile_path) {
        Ok(profile) => profile,
        Err(e) => {
            warn!("no usable startup profile, using defaults: {e}");
            Profile::default()
        }
    };
    let portal = Arc::new(ProfilePortal::new(startup_profile));

    let keys = KeyState::new();
    let handle = MapperHandle::new(keys, portal.clone(), app_config.cycle_interval());

    info!("Starting configuration surface");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default().with_inner_size([820.0, 720.0]);

    eframe::run_native(
        "padbridge",
        native_options,
        Box::new(|cc| Ok(Box::new(PadbridgeUI::new(cc, portal, handle, app_config)))),
    )
    .map_err(|e| eyre!("UI terminated with error: {e}"))?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
