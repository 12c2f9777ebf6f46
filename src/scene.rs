use eframe::egui::Color32;

use crate::color::{generate_palette, wavelength_color, with_alpha};
use crate::data::model::ChannelBand;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Plot scene: what the spectral plot draws, independent of egui_plot
// ---------------------------------------------------------------------------

/// One emission or excitation curve.
#[derive(Debug, Clone)]
pub struct CurveSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub color: Color32,
    /// Excitation curves are dashed.
    pub dashed: bool,
}

/// Shaded channel band.
#[derive(Debug, Clone)]
pub struct BandShade {
    pub name: String,
    pub band: ChannelBand,
    pub fill: Color32,
}

/// Vertical laser line.
#[derive(Debug, Clone)]
pub struct LaserMarker {
    pub name: String,
    pub wavelength: f64,
    pub color: Color32,
}

#[derive(Debug, Clone, Default)]
pub struct PlotScene {
    pub curves: Vec<CurveSeries>,
    pub bands: Vec<BandShade>,
    pub lasers: Vec<LaserMarker>,
}

impl PlotScene {
    /// Build the scene for a loaded session.
    ///
    /// Both curves of a fluorophore take the display colour of its emission
    /// peak; each laser line takes the colour of its own wavelength.
    pub fn build(session: &Session) -> Self {
        let mut curves = Vec::with_capacity(session.profiles.len() * 2);
        for profile in &session.profiles {
            let color = wavelength_color(profile.curve().peak_emission_wavelength());
            curves.push(CurveSeries {
                name: format!("{}, em", profile.name()),
                points: profile.curve().emission_points(),
                color,
                dashed: false,
            });
            curves.push(CurveSeries {
                name: format!("{}, ex", profile.name()),
                points: profile.curve().excitation_points(),
                color,
                dashed: true,
            });
        }

        let alpha = session.settings.plot.band_alpha;
        let bands = session
            .channels
            .iter()
            .zip(generate_palette(session.channels.len()))
            .map(|((id, band), color)| BandShade {
                name: id.to_string(),
                band: *band,
                fill: with_alpha(color, alpha),
            })
            .collect();

        let lasers = session
            .settings
            .lasers
            .iter()
            .map(|&wavelength| LaserMarker {
                name: format!("{wavelength} nm"),
                wavelength,
                color: wavelength_color(wavelength),
            })
            .collect();

        PlotScene {
            curves,
            bands,
            lasers,
        }
    }
}
