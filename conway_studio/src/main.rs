// main.rs - Conway Studio desktop shell
// Loads the config, starts tracing and hands the simulation to egui

use std::path::PathBuf;

use anyhow::{Context, Result};
use conway::StudioConfig;
use eframe::egui;
use tracing::info;

mod app;
mod store;

use app::StudioApp;

const CONFIG_ENV: &str = "CONWAY_STUDIO_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "conway_studio.json";

fn main() -> Result<()> {
    init_tracing();

    let config_path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = StudioConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!(
        path = %config_path.display(),
        rows = config.rows,
        cols = config.cols,
        rules = %config.rules,
        "config loaded"
    );

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let app = StudioApp::new(config, runtime)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 1000.0]),
        ..Default::default()
    };

    eframe::run_native("Conway Studio", options, Box::new(move |_cc| Box::new(app)))
        .map_err(|err| anyhow::anyhow!("eframe exited with error: {err}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
