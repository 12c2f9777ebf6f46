use eframe::egui;

use crate::color::parse_hex;
use crate::settings::PlotStyle;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CrosstalkApp {
    pub state: AppState,
}

impl CrosstalkApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

/// egui visuals for the configured plot style.
fn visuals_for(style: &PlotStyle) -> egui::Visuals {
    let mut visuals = if style.dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    match parse_hex(&style.facecolor) {
        Some(face) => {
            visuals.panel_fill = face;
            visuals.window_fill = face;
            visuals.extreme_bg_color = face;
        }
        None => log::warn!("Ignoring invalid facecolor '{}'", style.facecolor),
    }
    visuals
}

impl eframe::App for CrosstalkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.style_dirty {
            ctx.set_visuals(visuals_for(&self.state.plot_style()));
            self.state.style_dirty = false;
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: per-fluorophore data ----
        egui::SidePanel::left("fluorophore_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Bottom panel: crosstalk table ----
        egui::TopBottomPanel::bottom("results_panel")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| {
                panels::results_panel(ui, &self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::spectral_plot(ui, &self.state);
        });
    }
}
