use clap::Parser;
use eframe::egui;

use realty_lens::app::RealtyLensApp;
use realty_lens::{AppState, Args};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    let mut state = AppState::new(config);
    state.load_configured_files();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Realty Lens – Transaction Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(RealtyLensApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard: {e}"))
}
