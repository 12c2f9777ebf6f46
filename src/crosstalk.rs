use std::fmt;

use crate::data::model::{ChannelBand, Channels};
use crate::data::profile::FluorophoreProfile;

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Round to 3 decimal digits, ties to even.
///
/// Rounds the exact binary value through its decimal expansion, so near-ties
/// such as `1/400` are not pulled onto an exact tie.
pub fn round3(value: f64) -> f64 {
    format!("{value:.3}").parse().unwrap_or(value)
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a ratio could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Undefined {
    /// The second fluorophore's channel integral is zero.
    ZeroChannelIntegral,
    /// One or both fluorophores have no sample at the laser wavelength.
    MissingExcitation { fluorophores: Vec<String> },
    /// The second fluorophore's excitation at the laser is zero.
    ZeroExcitation,
}

impl fmt::Display for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Undefined::ZeroChannelIntegral => write!(f, "zero channel integral"),
            Undefined::MissingExcitation { fluorophores } => {
                write!(f, "no excitation sample for {}", fluorophores.join(", "))
            }
            Undefined::ZeroExcitation => write!(f, "zero excitation"),
        }
    }
}

/// Excitation-corrected ratio for one laser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Excitation ratio A/B at the laser.
    pub a_factor: f64,
    /// Channel ratio times `a_factor`.
    pub corrected_ratio: f64,
}

/// Result for one (channel, laser) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LaserOutcome {
    pub laser: f64,
    pub result: Result<Correction, Undefined>,
}

/// Result for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    pub channel: String,
    pub band: ChannelBand,
    /// Emission ratio A/B in this channel.
    pub channel_ratio: Result<f64, Undefined>,
    /// One entry per configured laser. When `channel_ratio` is undefined every
    /// entry carries the same reason.
    pub lasers: Vec<LaserOutcome>,
}

/// Pairwise crosstalk between two fluorophores over every channel.
#[derive(Debug, Clone, PartialEq)]
pub struct CrosstalkReport {
    pub first: String,
    pub second: String,
    pub channels: Vec<ChannelOutcome>,
}

impl CrosstalkReport {
    /// Corrected ratio for `(channel, laser)`, `None` when undefined or unknown.
    pub fn corrected_ratio(&self, channel: &str, laser: f64) -> Option<f64> {
        self.channels
            .iter()
            .find(|c| c.channel == channel)?
            .lasers
            .iter()
            .find(|l| l.laser == laser)?
            .result
            .as_ref()
            .ok()
            .map(|c| c.corrected_ratio)
    }

    /// Every successfully computed `(channel, laser, corrected ratio)`.
    pub fn defined(&self) -> impl Iterator<Item = (&str, f64, f64)> {
        self.channels.iter().flat_map(|c| {
            c.lasers.iter().filter_map(move |l| {
                l.result
                    .as_ref()
                    .ok()
                    .map(|corr| (c.channel.as_str(), l.laser, corr.corrected_ratio))
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Compute channel and excitation-corrected ratios of `a` over `b`.
///
/// Channels and lasers are visited in configured order. Zero divisors and
/// missing excitation samples produce [`Undefined`] entries and a log notice;
/// the remaining combinations are still computed.
pub fn compute(
    a: &FluorophoreProfile,
    b: &FluorophoreProfile,
    channels: &Channels,
    lasers: &[f64],
) -> CrosstalkReport {
    let (name_a, name_b) = (a.name(), b.name());

    let channels = channels
        .iter()
        .map(|(id, band)| {
            let integral_a = a.channel_integral(id).unwrap_or(0);
            let integral_b = b.channel_integral(id).unwrap_or(0);

            if integral_b == 0 {
                log::warn!(
                    "Ch. {id} {band}: {name_a} em./{name_b} em. ratio undefined, {name_b} integral is zero"
                );
                return ChannelOutcome {
                    channel: id.to_string(),
                    band: *band,
                    channel_ratio: Err(Undefined::ZeroChannelIntegral),
                    lasers: lasers
                        .iter()
                        .map(|&laser| LaserOutcome {
                            laser,
                            result: Err(Undefined::ZeroChannelIntegral),
                        })
                        .collect(),
                };
            }

            let channel_ratio = round3(integral_a as f64 / integral_b as f64);
            log::info!("Ch. {id} {band}: {name_a} em./{name_b} em. ratio = {channel_ratio}");

            let lasers = lasers
                .iter()
                .map(|&laser| LaserOutcome {
                    laser,
                    result: correct(a, b, laser, channel_ratio),
                })
                .inspect(|outcome| match &outcome.result {
                    Ok(c) => log::info!(
                        "  Ch. {id} at {} nm corrected ratio = {} (A={})",
                        outcome.laser,
                        c.corrected_ratio,
                        c.a_factor
                    ),
                    Err(reason) => log::warn!(
                        "  Ch. {id} at {} nm corrected ratio undefined: {reason}",
                        outcome.laser
                    ),
                })
                .collect();

            ChannelOutcome {
                channel: id.to_string(),
                band: *band,
                channel_ratio: Ok(channel_ratio),
                lasers,
            }
        })
        .collect();

    CrosstalkReport {
        first: name_a.to_string(),
        second: name_b.to_string(),
        channels,
    }
}

fn correct(
    a: &FluorophoreProfile,
    b: &FluorophoreProfile,
    laser: f64,
    channel_ratio: f64,
) -> Result<Correction, Undefined> {
    let (ex_a, ex_b) = match (a.excitation_at_laser(laser), b.excitation_at_laser(laser)) {
        (Some(ex_a), Some(ex_b)) => (ex_a, ex_b),
        (ex_a, ex_b) => {
            let fluorophores = [(a, ex_a), (b, ex_b)]
                .into_iter()
                .filter(|(_, ex)| ex.is_none())
                .map(|(p, _)| p.name().to_string())
                .collect();
            return Err(Undefined::MissingExcitation { fluorophores });
        }
    };

    if ex_b == 0.0 {
        return Err(Undefined::ZeroExcitation);
    }

    let a_factor = round3(ex_a / ex_b);
    Ok(Correction {
        a_factor,
        corrected_ratio: round3(channel_ratio * a_factor),
    })
}
