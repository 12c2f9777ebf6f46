use eframe::egui::{Stroke, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, Polygon};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectral plot (central panel)
// ---------------------------------------------------------------------------

/// Render spectra, channel bands and laser lines in the central panel.
pub fn spectral_plot(ui: &mut Ui, state: &AppState) {
    if state.session.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a settings file to view spectra  (File → Open settings…)");
        });
        return;
    }

    let style = state.plot_style();
    let scene = &state.scene;
    let (x_min, x_max) = style.x_range;
    let y_max = style.y_max;

    Plot::new("spectral_plot")
        .legend(Legend::default())
        .x_axis_label("Wavelength, nm")
        .y_axis_label("Intensity, %")
        .include_x(x_min)
        .include_x(x_max)
        .include_y(0.0)
        .include_y(y_max)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if state.show_channels {
                for shade in &scene.bands {
                    let (lo, hi) = (shade.band.low(), shade.band.high());
                    let corners: PlotPoints =
                        vec![[lo, 0.0], [hi, 0.0], [hi, y_max], [lo, y_max]].into();
                    plot_ui.polygon(
                        Polygon::new(corners)
                            .name(&shade.name)
                            .fill_color(shade.fill)
                            .stroke(Stroke::NONE),
                    );
                }
            }

            for curve in &scene.curves {
                let visible = if curve.dashed {
                    state.show_excitation
                } else {
                    state.show_emission
                };
                if !visible {
                    continue;
                }
                let mut line = Line::new(PlotPoints::from(curve.points.clone()))
                    .name(&curve.name)
                    .color(curve.color)
                    .width(1.5);
                if curve.dashed {
                    line = line.style(LineStyle::dashed_loose());
                }
                plot_ui.line(line);
            }

            if state.show_lasers {
                for laser in &scene.lasers {
                    let x = laser.wavelength;
                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![[x, 0.0], [x, y_max]]))
                            .name(&laser.name)
                            .color(laser.color)
                            .width(2.0),
                    );
                }
            }
        });
}
