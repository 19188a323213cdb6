mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;
mod view;

use app::DashboardApp;
use config::DashboardConfig;
use data::cache::PanelStore;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::default();

    // Read the panel once; every frame works from this shared copy.
    let store = PanelStore::new(&config.data_path);
    log::info!("Loading panel data from {}", store.path().display());
    let state = AppState::new(config.clone(), store.get());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        &config.title,
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
