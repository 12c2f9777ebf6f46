use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use crate::data::model::Channels;

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Which fluorophores, lasers and channel bands to use.
///
/// ```yaml
/// fluo_list: [DyeA, DyeB]
/// ex_list: [405, 488, 561]
/// ch_reg:
///   ch1: [500, 550]
///   ch2: [570, 620]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Fluorophore identifiers, matched against table file stems.
    #[serde(rename = "fluo_list")]
    pub fluorophores: Vec<String>,

    /// Laser wavelengths in nm.
    #[serde(rename = "ex_list")]
    pub lasers: Vec<f64>,

    /// Channel bands; absent means view-only.
    #[serde(rename = "ch_reg", default)]
    pub channels: Option<Channels>,

    #[serde(default)]
    pub plot: PlotStyle,

    #[serde(default)]
    pub load_policy: LoadPolicy,
}

/// What to do when one fluorophore's table is malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Log the failure and continue without that fluorophore.
    #[default]
    Skip,
    /// Fail the whole session.
    Abort,
}

/// Presentation settings handed to the plot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub dark: bool,
    /// Background colour as `#rrggbb`.
    pub facecolor: String,
    /// Visible wavelength range in nm.
    pub x_range: (f64, f64),
    /// Top of the intensity axis, also the height of bands and laser lines.
    pub y_max: f64,
    /// Opacity of channel band shading.
    pub band_alpha: f32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            dark: true,
            facecolor: "#272b30".to_string(),
            x_range: (300.0, 800.0),
            y_max: 110.0,
            band_alpha: 0.35,
        }
    }
}

impl Settings {
    /// Load settings from a file.  Dispatch by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let settings = match ext.as_str() {
            "yml" | "yaml" => Self::from_yaml(&text),
            "json" => Self::from_json(&text),
            other => bail!("Unsupported settings extension: .{other}"),
        }
        .with_context(|| format!("parsing settings file {}", path.display()))?;

        log::info!("Settings file {} loaded", path.display());
        Ok(settings)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(text).context("parsing YAML")?;
        settings.validated()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text).context("parsing JSON")?;
        settings.validated()
    }

    fn validated(self) -> Result<Self> {
        ensure!(
            !self.fluorophores.is_empty(),
            "fluo_list must name at least one fluorophore"
        );
        if let Some(bad) = self.lasers.iter().find(|l| !l.is_finite() || **l <= 0.0) {
            bail!("ex_list contains an invalid laser wavelength: {bad}");
        }
        let (lo, hi) = self.plot.x_range;
        ensure!(lo < hi, "plot.x_range must be increasing, got ({lo}, {hi})");
        Ok(self)
    }

    /// Configured channels, empty when none are given.
    pub fn channels(&self) -> Channels {
        self.channels.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_settings_with_channels() {
        let settings = Settings::from_yaml(
            "fluo_list: [DyeA, DyeB]\n\
             ex_list: [405, 488.0]\n\
             ch_reg:\n  ch2: [570, 620]\n  ch1: [500, 550]\n",
        )
        .unwrap();

        assert_eq!(settings.fluorophores, vec!["DyeA", "DyeB"]);
        assert_eq!(settings.lasers, vec![405.0, 488.0]);
        let ids: Vec<String> = settings
            .channels()
            .iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["ch2", "ch1"]);
        assert_eq!(settings.load_policy, LoadPolicy::Skip);
        assert_eq!(settings.plot, PlotStyle::default());
    }

    #[test]
    fn missing_channels_means_empty() {
        let settings = Settings::from_yaml("fluo_list: [DyeA]\nex_list: [488]\n").unwrap();
        assert!(settings.channels.is_none());
        assert!(settings.channels().is_empty());
    }

    #[test]
    fn json_settings_with_overrides() {
        let settings = Settings::from_json(
            r#"{
                "fluo_list": ["DyeA"],
                "ex_list": [488],
                "plot": {"dark": false, "y_max": 120},
                "load_policy": "abort"
            }"#,
        )
        .unwrap();

        assert!(!settings.plot.dark);
        assert_eq!(settings.plot.y_max, 120.0);
        assert_eq!(settings.plot.x_range, (300.0, 800.0));
        assert_eq!(settings.load_policy, LoadPolicy::Abort);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(Settings::from_yaml("fluo_list: []\nex_list: [488]\n").is_err());
        assert!(Settings::from_yaml("fluo_list: [A]\n").is_err());
        assert!(Settings::from_yaml("fluo_list: [A]\nex_list: [-5]\n").is_err());
        assert!(
            Settings::from_yaml("fluo_list: [A]\nex_list: [488]\nch_reg:\n  ch1: [550, 500]\n")
                .is_err()
        );
        assert!(Settings::from_yaml("fluo_list: [A]\nex_list: [488]\nlasers: [1]\n").is_err());
    }
}
