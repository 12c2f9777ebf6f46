use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::error::DataFormatError;

// ---------------------------------------------------------------------------
// SpectralSample – one row of a spectral table
// ---------------------------------------------------------------------------

/// Excitation and emission intensity at a single wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralSample {
    /// Wavelength in nm.
    pub wavelength: f64,
    /// Excitation intensity, percent.
    pub excitation: f64,
    /// Emission intensity, percent.
    pub emission: f64,
}

/// Scale the source table was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityScale {
    /// Already 0–100, stored as-is.
    Percent,
    /// 0–1 fractions, multiplied by 100 at load.
    Fraction,
}

// ---------------------------------------------------------------------------
// SpectralCurve – the normalized curves of one fluorophore
// ---------------------------------------------------------------------------

/// Excitation and emission spectra of one fluorophore, sorted by wavelength.
///
/// Intensities are on a percentage scale. A table whose emission never
/// exceeds 1.0 is treated as fractional and rescaled exactly once, when the
/// curve is built.
#[derive(Debug, Clone)]
pub struct SpectralCurve {
    samples: Vec<SpectralSample>,
    scale: IntensityScale,
}

impl SpectralCurve {
    /// Build a curve from three parallel columns.
    ///
    /// Rows may arrive in any order; wavelengths must be finite and unique.
    pub fn from_columns(
        wavelength: Vec<f64>,
        excitation: Vec<f64>,
        emission: Vec<f64>,
    ) -> Result<Self, DataFormatError> {
        if wavelength.len() != excitation.len() || wavelength.len() != emission.len() {
            return Err(DataFormatError::LengthMismatch {
                wavelength: wavelength.len(),
                excitation: excitation.len(),
                emission: emission.len(),
            });
        }
        if wavelength.is_empty() {
            return Err(DataFormatError::Empty);
        }

        let mut samples = Vec::with_capacity(wavelength.len());
        for (row, ((w, ex), em)) in wavelength
            .into_iter()
            .zip(excitation)
            .zip(emission)
            .enumerate()
        {
            for (column, value) in [("wavelength", w), ("excitation", ex), ("emission", em)] {
                if !value.is_finite() {
                    return Err(DataFormatError::NonFinite { row, column, value });
                }
            }
            samples.push(SpectralSample {
                wavelength: w,
                excitation: ex,
                emission: em,
            });
        }

        samples.sort_by(|a, b| a.wavelength.total_cmp(&b.wavelength));
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[0].wavelength == pair[1].wavelength)
        {
            return Err(DataFormatError::DuplicateWavelength(pair[0].wavelength));
        }

        let max_emission = samples
            .iter()
            .map(|s| s.emission)
            .fold(f64::NEG_INFINITY, f64::max);

        let scale = if max_emission <= 1.0 {
            for s in &mut samples {
                s.excitation *= 100.0;
                s.emission *= 100.0;
            }
            IntensityScale::Fraction
        } else {
            IntensityScale::Percent
        };

        Ok(SpectralCurve { samples, scale })
    }

    /// All samples, ascending by wavelength.
    pub fn samples(&self) -> &[SpectralSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Scale detected in the source table.
    pub fn scale(&self) -> IntensityScale {
        self.scale
    }

    /// The sample recorded at exactly `wavelength`, if any.
    pub fn sample_at(&self, wavelength: f64) -> Option<&SpectralSample> {
        self.samples
            .binary_search_by(|s| s.wavelength.total_cmp(&wavelength))
            .ok()
            .map(|i| &self.samples[i])
    }

    /// Samples with `low <= wavelength <= high`.
    pub fn band(&self, band: &ChannelBand) -> &[SpectralSample] {
        let start = self.samples.partition_point(|s| s.wavelength < band.low);
        let end = self.samples.partition_point(|s| s.wavelength <= band.high);
        &self.samples[start..end.max(start)]
    }

    /// Wavelength of the first emission maximum.
    pub fn peak_emission_wavelength(&self) -> f64 {
        let mut peak = self.samples[0];
        for s in &self.samples[1..] {
            if s.emission > peak.emission {
                peak = *s;
            }
        }
        peak.wavelength
    }

    pub fn max_emission(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.emission)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn max_excitation(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.excitation)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// `[wavelength, emission]` pairs for plotting.
    pub fn emission_points(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(|s| [s.wavelength, s.emission]).collect()
    }

    /// `[wavelength, excitation]` pairs for plotting.
    pub fn excitation_points(&self) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .map(|s| [s.wavelength, s.excitation])
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ChannelBand – a detection window
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("invalid channel band [{low}, {high}]: bounds must be finite with low <= high")]
pub struct InvalidBand {
    pub low: f64,
    pub high: f64,
}

/// Closed wavelength window `[low, high]` in nm.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "(f64, f64)")]
pub struct ChannelBand {
    low: f64,
    high: f64,
}

impl ChannelBand {
    pub fn new(low: f64, high: f64) -> Result<Self, InvalidBand> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(InvalidBand { low, high });
        }
        Ok(ChannelBand { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

impl TryFrom<(f64, f64)> for ChannelBand {
    type Error = InvalidBand;

    fn try_from((low, high): (f64, f64)) -> Result<Self, Self::Error> {
        ChannelBand::new(low, high)
    }
}

impl fmt::Display for ChannelBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

// ---------------------------------------------------------------------------
// Channels – ordered channel id → band mapping
// ---------------------------------------------------------------------------

/// Channel bands in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channels(Vec<(String, ChannelBand)>);

impl Channels {
    pub fn new(entries: Vec<(String, ChannelBand)>) -> Self {
        Channels(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelBand)> {
        self.0.iter().map(|(id, band)| (id.as_str(), band))
    }

    pub fn get(&self, id: &str) -> Option<&ChannelBand> {
        self.0.iter().find(|(k, _)| k == id).map(|(_, band)| band)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Maps deserialize in document order, which a BTreeMap would lose.
impl<'de> Deserialize<'de> for Channels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChannelsVisitor;

        impl<'de> Visitor<'de> for ChannelsVisitor {
            type Value = Channels;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of channel id to [low, high]")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Channels, A::Error> {
                let mut entries: Vec<(String, ChannelBand)> = Vec::new();
                while let Some((id, band)) = map.next_entry::<String, ChannelBand>()? {
                    if entries.iter().any(|(k, _)| *k == id) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate channel id '{id}'"
                        )));
                    }
                    entries.push((id, band));
                }
                Ok(Channels(entries))
            }
        }

        deserializer.deserialize_map(ChannelsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn percent_table_is_stored_unchanged() {
        let curve = SpectralCurve::from_columns(
            vec![480.0, 520.0],
            vec![50.0, 10.0],
            vec![10.0, 80.0],
        )
        .unwrap();

        assert_eq!(curve.scale(), IntensityScale::Percent);
        assert_eq!(curve.samples()[1].emission, 80.0);
        assert_eq!(curve.samples()[0].excitation, 50.0);
    }

    #[test]
    fn fraction_table_is_rescaled_once() {
        // Max emission 0.005 would still be <= 1 after one rescale,
        // so a second pass would be visible as 0.5 * 100.
        let curve = SpectralCurve::from_columns(
            vec![500.0, 510.0],
            vec![0.002, 0.004],
            vec![0.001, 0.005],
        )
        .unwrap();

        assert_eq!(curve.scale(), IntensityScale::Fraction);
        assert_relative_eq!(curve.max_emission(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(curve.max_excitation(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn emission_of_exactly_one_counts_as_fraction() {
        let curve =
            SpectralCurve::from_columns(vec![500.0], vec![0.3], vec![1.0]).unwrap();

        assert_eq!(curve.scale(), IntensityScale::Fraction);
        assert_relative_eq!(curve.max_emission(), 100.0);
        assert_relative_eq!(curve.max_excitation(), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn rows_are_sorted_by_wavelength() {
        let curve = SpectralCurve::from_columns(
            vec![520.0, 480.0, 500.0],
            vec![1.0, 2.0, 3.0],
            vec![10.0, 20.0, 30.0],
        )
        .unwrap();

        let w: Vec<f64> = curve.samples().iter().map(|s| s.wavelength).collect();
        assert_eq!(w, vec![480.0, 500.0, 520.0]);
        assert_eq!(curve.samples()[0].emission, 20.0);
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let err = SpectralCurve::from_columns(vec![1.0, 2.0], vec![1.0], vec![1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, DataFormatError::LengthMismatch { .. }));
    }

    #[test]
    fn empty_and_duplicate_tables_are_rejected() {
        assert!(matches!(
            SpectralCurve::from_columns(vec![], vec![], vec![]),
            Err(DataFormatError::Empty)
        ));
        assert!(matches!(
            SpectralCurve::from_columns(vec![500.0, 500.0], vec![1.0, 2.0], vec![3.0, 4.0]),
            Err(DataFormatError::DuplicateWavelength(w)) if w == 500.0
        ));
        assert!(matches!(
            SpectralCurve::from_columns(vec![f64::NAN], vec![1.0], vec![3.0]),
            Err(DataFormatError::NonFinite { column: "wavelength", .. })
        ));
    }

    #[test]
    fn band_selection_is_inclusive() {
        let curve = SpectralCurve::from_columns(
            vec![490.0, 500.0, 525.0, 550.0, 560.0],
            vec![0.0; 5],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();

        let band = ChannelBand::new(500.0, 550.0).unwrap();
        let emission: Vec<f64> = curve.band(&band).iter().map(|s| s.emission).collect();
        assert_eq!(emission, vec![2.0, 3.0, 4.0]);

        let empty = ChannelBand::new(600.0, 700.0).unwrap();
        assert!(curve.band(&empty).is_empty());
    }

    #[test]
    fn exact_sample_lookup() {
        let curve = SpectralCurve::from_columns(
            vec![480.0, 520.0],
            vec![50.0, 10.0],
            vec![10.0, 80.0],
        )
        .unwrap();

        assert_eq!(curve.sample_at(480.0).map(|s| s.excitation), Some(50.0));
        assert!(curve.sample_at(488.0).is_none());
        assert_eq!(curve.peak_emission_wavelength(), 520.0);
    }

    #[test]
    fn band_bounds_are_validated() {
        assert!(ChannelBand::new(550.0, 500.0).is_err());
        assert!(ChannelBand::new(f64::NAN, 500.0).is_err());
        assert!(ChannelBand::new(500.0, 500.0).is_ok());
    }

    #[test]
    fn channels_keep_document_order() {
        let channels: Channels =
            serde_json::from_str(r#"{"ch2": [570, 620], "ch1": [500, 550]}"#).unwrap();

        let ids: Vec<&str> = channels.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["ch2", "ch1"]);
        assert_eq!(channels.get("ch1"), Some(&ChannelBand::new(500.0, 550.0).unwrap()));
    }

    #[test]
    fn inverted_band_fails_to_deserialize() {
        let result: Result<Channels, _> = serde_json::from_str(r#"{"ch1": [550, 500]}"#);
        assert!(result.is_err());
    }
}
