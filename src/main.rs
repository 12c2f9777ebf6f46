mod app;
mod color;
mod crosstalk;
mod data;
mod scene;
mod session;
mod settings;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use app::CrosstalkApp;
use clap::Parser;
use eframe::egui;
use session::Session;
use settings::LoadPolicy;
use state::AppState;

/// Fluorophore channel crosstalk calculator.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file (.yml, .yaml or .json); spectral tables are searched
    /// for in its directory.
    settings: Option<PathBuf>,

    /// Log the report and exit without opening a window.
    #[arg(long, requires = "settings")]
    headless: bool,

    /// Abort when any spectral table is malformed instead of skipping it.
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let policy = cli.strict.then_some(LoadPolicy::Abort);

    if cli.headless {
        let path = cli.settings.context("--headless needs a settings file")?;
        let session = Session::load(&path, policy)?;
        session.log_report();
        return Ok(());
    }

    let mut state = AppState {
        policy_override: policy,
        ..AppState::default()
    };
    if let Some(path) = &cli.settings {
        state.load_settings(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Fluoro Crosstalk – Channel Calculator",
        options,
        Box::new(|_cc| Ok(Box::new(CrosstalkApp::new(state)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
