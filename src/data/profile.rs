use super::model::{Channels, ChannelBand, SpectralCurve};

// ---------------------------------------------------------------------------
// FluorophoreProfile – a curve plus its laser and channel aggregates
// ---------------------------------------------------------------------------

/// Excitation level of a fluorophore at one laser line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserExcitation {
    pub laser: f64,
    pub level: f64,
}

/// Summed emission of a fluorophore inside one channel band.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelIntegral {
    pub channel: String,
    pub band: ChannelBand,
    pub integral: i64,
}

/// One fluorophore with everything the crosstalk calculator needs.
///
/// Built once by [`FluorophoreProfile::new`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct FluorophoreProfile {
    name: String,
    curve: SpectralCurve,
    excitation: Vec<LaserExcitation>,
    missing_lasers: Vec<f64>,
    integrals: Vec<ChannelIntegral>,
}

impl FluorophoreProfile {
    /// Derive per-laser excitation and per-channel integrals from `curve`.
    ///
    /// A laser without a sample at exactly its wavelength is left out of the
    /// excitation map and listed in [`missing_lasers`](Self::missing_lasers).
    pub fn new(name: &str, curve: SpectralCurve, lasers: &[f64], channels: &Channels) -> Self {
        log::info!("{name}: spectra loaded ({} samples)", curve.len());

        let mut excitation = Vec::with_capacity(lasers.len());
        let mut missing_lasers = Vec::new();
        for &laser in lasers {
            match curve.sample_at(laser) {
                Some(sample) => {
                    log::info!("{name} | {laser} nm excitation = {}", sample.excitation);
                    excitation.push(LaserExcitation {
                        laser,
                        level: sample.excitation,
                    });
                }
                None => {
                    log::warn!("{name} does not excite at {laser} nm (no sample)");
                    missing_lasers.push(laser);
                }
            }
        }

        let integrals = channels
            .iter()
            .map(|(id, band)| {
                let sum: f64 = curve.band(band).iter().map(|s| s.emission).sum();
                let integral = sum.round_ties_even() as i64;
                log::info!("{name} integral intensity | {id} {band} nm = {integral}");
                ChannelIntegral {
                    channel: id.to_string(),
                    band: *band,
                    integral,
                }
            })
            .collect();

        FluorophoreProfile {
            name: name.to_string(),
            curve,
            excitation,
            missing_lasers,
            integrals,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn curve(&self) -> &SpectralCurve {
        &self.curve
    }

    /// Excitation level at `laser`, `None` if the curve has no sample there.
    pub fn excitation_at_laser(&self, laser: f64) -> Option<f64> {
        self.excitation
            .iter()
            .find(|e| e.laser == laser)
            .map(|e| e.level)
    }

    /// Emission integral of channel `id`, `None` for an unknown channel.
    pub fn channel_integral(&self, id: &str) -> Option<i64> {
        self.integrals
            .iter()
            .find(|c| c.channel == id)
            .map(|c| c.integral)
    }

    /// Excitation entries in laser-list order.
    pub fn excitation(&self) -> &[LaserExcitation] {
        &self.excitation
    }

    /// Configured lasers the curve has no sample for.
    pub fn missing_lasers(&self) -> &[f64] {
        &self.missing_lasers
    }

    /// Channel integrals in channel order.
    pub fn integrals(&self) -> &[ChannelIntegral] {
        &self.integrals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dye_a() -> SpectralCurve {
        SpectralCurve::from_columns(vec![480.0, 520.0], vec![50.0, 10.0], vec![10.0, 80.0])
            .unwrap()
    }

    fn channels(entries: &[(&str, f64, f64)]) -> Channels {
        Channels::new(
            entries
                .iter()
                .map(|&(id, lo, hi)| (id.to_string(), ChannelBand::new(lo, hi).unwrap()))
                .collect(),
        )
    }

    #[test]
    fn single_dye_channel_and_laser() {
        let profile =
            FluorophoreProfile::new("DyeA", dye_a(), &[480.0], &channels(&[("ch1", 500.0, 550.0)]));

        assert_eq!(profile.name(), "DyeA");
        assert_eq!(profile.channel_integral("ch1"), Some(80));
        assert_eq!(profile.excitation_at_laser(480.0), Some(50.0));
        assert!(profile.missing_lasers().is_empty());
    }

    #[test]
    fn laser_without_sample_is_omitted() {
        let lasers = [405.0, 480.0, 488.0];
        let profile = FluorophoreProfile::new("DyeA", dye_a(), &lasers, &Channels::default());

        let present: Vec<f64> = profile.excitation().iter().map(|e| e.laser).collect();
        assert_eq!(present, vec![480.0]);
        assert_eq!(profile.missing_lasers(), &[405.0, 488.0]);
        assert!(present.iter().all(|l| lasers.contains(l)));
        for laser in lasers {
            assert_eq!(
                profile.excitation_at_laser(laser).is_some(),
                profile.curve().sample_at(laser).is_some()
            );
        }
    }

    #[test]
    fn empty_band_integrates_to_zero() {
        let profile = FluorophoreProfile::new(
            "DyeA",
            dye_a(),
            &[],
            &channels(&[("far_red", 650.0, 700.0), ("gap", 490.0, 510.0)]),
        );

        assert_eq!(profile.channel_integral("far_red"), Some(0));
        assert_eq!(profile.channel_integral("gap"), Some(0));
        assert_eq!(profile.channel_integral("missing"), None);
    }

    #[test]
    fn integral_is_a_plain_rounded_sum() {
        let curve = SpectralCurve::from_columns(
            vec![500.0, 501.0, 510.0],
            vec![0.0; 3],
            vec![10.25, 20.25, 30.0],
        )
        .unwrap();
        let profile =
            FluorophoreProfile::new("Irregular", curve, &[], &channels(&[("ch1", 500.0, 510.0)]));

        // 60.5 before rounding; ties go to even.
        assert_eq!(profile.channel_integral("ch1"), Some(60));
    }

    #[test]
    fn channels_keep_configured_order() {
        let profile = FluorophoreProfile::new(
            "DyeA",
            dye_a(),
            &[],
            &channels(&[("b", 500.0, 550.0), ("a", 470.0, 490.0)]),
        );

        let ids: Vec<&str> = profile.integrals().iter().map(|c| c.channel.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(profile.channel_integral("a"), Some(10));
    }
}
