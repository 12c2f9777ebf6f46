use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::crosstalk::Undefined;
use crate::data::model::IntensityScale;
use crate::session::RunMode;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – per-fluorophore data
// ---------------------------------------------------------------------------

/// Render the left panel with excitation levels and channel integrals.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Fluorophores");
    ui.separator();

    let session = match &state.session {
        Some(s) => s,
        None => {
            ui.label("No settings loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for profile in &session.profiles {
                egui::CollapsingHeader::new(RichText::new(profile.name()).strong())
                    .id_salt(profile.name())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        let curve = profile.curve();
                        ui.label(format!(
                            "{} samples, peak emission {} nm",
                            curve.len(),
                            curve.peak_emission_wavelength()
                        ));
                        ui.label(format!(
                            "max em. {:.1} %, max ex. {:.1} %",
                            curve.max_emission(),
                            curve.max_excitation()
                        ));
                        if curve.scale() == IntensityScale::Fraction {
                            ui.weak("rescaled from 0–1 table");
                        }

                        ui.strong("Excitation");
                        for e in profile.excitation() {
                            ui.label(format!("{} nm: {:.1} %", e.laser, e.level));
                        }
                        for laser in profile.missing_lasers() {
                            ui.label(
                                RichText::new(format!("{laser} nm: no sample"))
                                    .color(Color32::LIGHT_RED),
                            );
                        }

                        if !profile.integrals().is_empty() {
                            ui.strong("Channel integrals");
                            for c in profile.integrals() {
                                ui.label(format!("{} {}: {}", c.channel, c.band, c.integral));
                            }
                        }
                    });
            }

            for (name, reason) in &session.failures {
                ui.label(RichText::new(format!("{name}: {reason}")).color(Color32::RED));
            }
        });
}

// ---------------------------------------------------------------------------
// Bottom panel – crosstalk table
// ---------------------------------------------------------------------------

/// Render the channel × laser table of corrected ratios.
pub fn results_panel(ui: &mut Ui, state: &AppState) {
    let Some(session) = &state.session else {
        return;
    };
    let Some(report) = &session.report else {
        ui.label("View mode: load two fluorophores and channel bands to compute crosstalk.");
        return;
    };

    ui.strong(format!(
        "Crosstalk {} / {} (corrected ratio, A factor)",
        report.first, report.second
    ));

    let lasers = &session.settings.lasers;
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(70.0))
        .columns(Column::auto().at_least(150.0), lasers.len())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Channel");
            });
            header.col(|ui| {
                ui.strong("Band, nm");
            });
            header.col(|ui| {
                ui.strong("Em. ratio");
            });
            for laser in lasers {
                header.col(|ui| {
                    ui.strong(format!("{laser} nm"));
                });
            }
        })
        .body(|mut body| {
            for ch in &report.channels {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&ch.channel);
                    });
                    row.col(|ui| {
                        ui.label(ch.band.to_string());
                    });
                    row.col(|ui| match &ch.channel_ratio {
                        Ok(ratio) => {
                            ui.label(ratio.to_string());
                        }
                        Err(reason) => undefined_label(ui, reason),
                    });
                    for laser in lasers {
                        row.col(|ui| {
                            let result = ch
                                .lasers
                                .iter()
                                .find(|l| l.laser == *laser)
                                .map(|l| l.result.as_ref());
                            match result {
                                Some(Ok(c)) => {
                                    ui.label(format!("{} (A={})", c.corrected_ratio, c.a_factor));
                                }
                                Some(Err(reason)) => undefined_label(ui, reason),
                                None => match &ch.channel_ratio {
                                    Err(reason) => undefined_label(ui, reason),
                                    Ok(_) => {
                                        ui.label("–");
                                    }
                                },
                            }
                        });
                    }
                });
            }
        });
}

fn undefined_label(ui: &mut Ui, reason: &Undefined) {
    ui.label(RichText::new(format!("undefined ({reason})")).color(Color32::LIGHT_RED));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open settings…").clicked() {
                open_settings_dialog(state);
                ui.close_menu();
            }
            let can_reload = state
                .session
                .as_ref()
                .is_some_and(|s| s.settings_path.is_some());
            if ui.add_enabled(can_reload, egui::Button::new("Reload")).clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            let mode = match session.mode {
                RunMode::Ratio { .. } => "ratio mode",
                RunMode::View => "view mode",
            };
            ui.label(format!(
                "{} fluorophore(s), {} channel(s), {mode}",
                session.profiles.len(),
                session.channels.len()
            ));
        }

        ui.separator();

        ui.toggle_value(&mut state.show_emission, "Emission");
        ui.toggle_value(&mut state.show_excitation, "Excitation");
        ui.toggle_value(&mut state.show_channels, "Channels");
        ui.toggle_value(&mut state.show_lasers, "Lasers");

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_settings_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open crosstalk settings")
        .add_filter("Settings", &["yml", "yaml", "json"])
        .pick_file();

    if let Some(path) = file {
        state.load_settings(&path);
    }
}
