use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::crosstalk::{self, CrosstalkReport};
use crate::data::loader::{discover_tables, load_spectral_table};
use crate::data::model::Channels;
use crate::data::profile::FluorophoreProfile;
use crate::settings::{LoadPolicy, Settings};

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

/// How the loaded session is used, decided once after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    /// Two fluorophores and at least one channel: compute crosstalk ratios.
    Ratio { first: usize, second: usize },
    /// Per-fluorophore data only.
    View,
}

impl RunMode {
    /// Pick the mode for the loaded profiles and configured channels.
    ///
    /// The pair is the first two names in `configured`; both must be among
    /// the loaded `profiles`, otherwise the session is view only.
    pub fn select(
        configured: &[String],
        profiles: &[FluorophoreProfile],
        channels: &Channels,
    ) -> Self {
        if channels.is_empty() {
            log::info!("No band pass channels selected, view mode");
            return RunMode::View;
        }
        let [first_name, second_name, rest @ ..] = configured else {
            log::info!(
                "{} fluorophore(s) configured, at least two needed for ratios, view mode",
                configured.len()
            );
            return RunMode::View;
        };
        if !rest.is_empty() {
            log::warn!("Only the first two fluorophores are compared, view only: {rest:?}");
        }

        let position = |name: &str| profiles.iter().position(|p| p.name() == name);
        match (position(first_name.as_str()), position(second_name.as_str())) {
            (Some(first), Some(second)) => {
                log::info!("Double fluorophore mode: {first_name} / {second_name}");
                RunMode::Ratio { first, second }
            }
            (first, second) => {
                let missing: Vec<&str> = [(first_name, first), (second_name, second)]
                    .into_iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| name.as_str())
                    .collect();
                log::warn!("Pair member(s) {missing:?} not loaded, view mode");
                RunMode::View
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session – settings, profiles and results for one settings file
// ---------------------------------------------------------------------------

/// Everything loaded from one settings file.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings_path: Option<PathBuf>,
    pub settings: Settings,
    pub channels: Channels,
    /// Loaded profiles, in settings order.
    pub profiles: Vec<FluorophoreProfile>,
    /// Fluorophores that could not be loaded, with the reason.
    pub failures: Vec<(String, String)>,
    pub mode: RunMode,
    /// Present in ratio mode.
    pub report: Option<CrosstalkReport>,
}

impl Session {
    /// Load settings from `path` and the tables found next to it.
    ///
    /// `policy` overrides the policy in the settings file when given.
    pub fn load(path: &Path, policy: Option<LoadPolicy>) -> Result<Self> {
        let mut settings = Settings::load(path)?;
        if let Some(policy) = policy {
            settings.load_policy = policy;
        }
        let root = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut session = Self::from_settings(settings, &root)?;
        session.settings_path = Some(path.to_path_buf());
        Ok(session)
    }

    /// Discover, load and evaluate the fluorophores named in `settings`.
    pub fn from_settings(settings: Settings, table_root: &Path) -> Result<Self> {
        let tables = discover_tables(table_root, &settings.fluorophores)?;
        let channels = settings.channels();

        let mut profiles = Vec::new();
        let mut failures = Vec::new();
        for name in &settings.fluorophores {
            let Some(path) = tables.get(name) else {
                failures.push((name.clone(), "no spectral table found".to_string()));
                continue;
            };
            match load_spectral_table(path) {
                Ok(curve) => {
                    profiles.push(FluorophoreProfile::new(
                        name,
                        curve,
                        &settings.lasers,
                        &channels,
                    ));
                }
                Err(e) if settings.load_policy == LoadPolicy::Abort => {
                    return Err(e).with_context(|| format!("loading {name}"));
                }
                Err(e) => {
                    log::error!("Skipping {name}: {e:#}");
                    failures.push((name.clone(), format!("{e:#}")));
                }
            }
        }

        if profiles.is_empty() {
            bail!(
                "none of the configured fluorophores could be loaded: {:?}",
                settings.fluorophores
            );
        }

        Ok(Self::from_profiles(settings, channels, profiles, failures))
    }

    /// Assemble a session from already built profiles.
    pub fn from_profiles(
        settings: Settings,
        channels: Channels,
        profiles: Vec<FluorophoreProfile>,
        failures: Vec<(String, String)>,
    ) -> Self {
        let mode = RunMode::select(&settings.fluorophores, &profiles, &channels);
        let report = match mode {
            RunMode::Ratio { first, second } => Some(crosstalk::compute(
                &profiles[first],
                &profiles[second],
                &channels,
                &settings.lasers,
            )),
            RunMode::View => None,
        };

        Session {
            settings_path: None,
            settings,
            channels,
            profiles,
            failures,
            mode,
            report,
        }
    }

    /// Write the full per-fluorophore and crosstalk report to the log.
    pub fn log_report(&self) {
        for profile in &self.profiles {
            log::info!("==> {} <==", profile.name());
            for e in profile.excitation() {
                log::info!("  {} nm excitation = {}", e.laser, e.level);
            }
            for laser in profile.missing_lasers() {
                log::info!("  {laser} nm excitation = undefined (no sample)");
            }
            for c in profile.integrals() {
                log::info!("  {} {} nm integral = {}", c.channel, c.band, c.integral);
            }
        }
        for (name, reason) in &self.failures {
            log::error!("{name} not loaded: {reason}");
        }

        let Some(report) = &self.report else {
            log::info!("View mode, no crosstalk ratios");
            return;
        };
        log::info!(
            "Crosstalk {} / {}: {} corrected ratio(s) defined",
            report.first,
            report.second,
            report.defined().count()
        );
        for ch in &report.channels {
            match &ch.channel_ratio {
                Ok(ratio) => log::info!("Ch. {} {} em. ratio = {ratio}", ch.channel, ch.band),
                Err(reason) => {
                    log::info!("Ch. {} {} em. ratio = undefined ({reason})", ch.channel, ch.band)
                }
            }
            for l in &ch.lasers {
                match &l.result {
                    Ok(c) => log::info!(
                        "  {} nm corrected ratio = {} (A={})",
                        l.laser,
                        c.corrected_ratio,
                        c.a_factor
                    ),
                    Err(reason) => {
                        log::info!("  {} nm corrected ratio = undefined ({reason})", l.laser)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::model::{ChannelBand, SpectralCurve};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fluoro-crosstalk-session-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const SETTINGS_PAIR: &str = "fluo_list: [DyeA, DyeB]\nex_list: [480]\nch_reg:\n  ch1: [500, 550]\n";

    #[test]
    fn two_dyes_with_channel_compute_ratios() {
        let dir = scratch_dir("pair");
        std::fs::write(dir.join("settings.yml"), SETTINGS_PAIR).unwrap();
        std::fs::write(dir.join("DyeA.csv"), "w,ex,em\n480,50,10\n520,10,80\n").unwrap();
        std::fs::write(dir.join("DyeB.csv"), "w,ex,em\n480,0.25,0.05\n520,0.05,0.4\n").unwrap();

        let session = Session::load(&dir.join("settings.yml"), None).unwrap();

        assert_eq!(session.mode, RunMode::Ratio { first: 0, second: 1 });
        let report = session.report.as_ref().unwrap();
        assert_eq!(report.corrected_ratio("ch1", 480.0), Some(4.0));
        session.log_report();

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn single_dye_is_view_only() {
        let dir = scratch_dir("single");
        std::fs::write(
            dir.join("settings.yml"),
            "fluo_list: [DyeA]\nex_list: [480]\nch_reg:\n  ch1: [500, 550]\n",
        )
        .unwrap();
        std::fs::write(dir.join("DyeA.csv"), "w,ex,em\n480,50,10\n520,10,80\n").unwrap();

        let session = Session::load(&dir.join("settings.yml"), None).unwrap();

        assert_eq!(session.mode, RunMode::View);
        assert!(session.report.is_none());
        assert_eq!(session.profiles[0].channel_integral("ch1"), Some(80));
        assert_eq!(session.profiles[0].excitation_at_laser(480.0), Some(50.0));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_table_is_skipped_or_aborts() {
        let dir = scratch_dir("malformed");
        std::fs::write(dir.join("settings.yml"), SETTINGS_PAIR).unwrap();
        std::fs::write(dir.join("DyeA.csv"), "w,ex,em\n480,50,10\n520,10,80\n").unwrap();
        std::fs::write(dir.join("DyeB.csv"), "w,ex\n480,oops\n").unwrap();

        let session = Session::load(&dir.join("settings.yml"), None).unwrap();
        assert_eq!(session.mode, RunMode::View);
        assert_eq!(session.profiles.len(), 1);
        assert_eq!(session.failures[0].0, "DyeB");

        let aborted = Session::load(&dir.join("settings.yml"), Some(LoadPolicy::Abort));
        assert!(aborted.is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn no_channels_means_view_mode() {
        let settings = Settings::from_yaml("fluo_list: [A, B]\nex_list: [480]\n").unwrap();
        let curve =
            || SpectralCurve::from_columns(vec![480.0], vec![50.0], vec![10.0]).unwrap();
        let channels = settings.channels();
        let profiles = vec![
            FluorophoreProfile::new("A", curve(), &settings.lasers, &channels),
            FluorophoreProfile::new("B", curve(), &settings.lasers, &channels),
        ];

        let session = Session::from_profiles(settings, channels, profiles, Vec::new());
        assert_eq!(session.mode, RunMode::View);
        assert!(session.report.is_none());
    }

    #[test]
    fn third_dye_does_not_change_the_pair() {
        let ch = Channels::new(vec![(
            "ch1".to_string(),
            ChannelBand::new(500.0, 550.0).unwrap(),
        )]);
        let curve = |em: f64| {
            SpectralCurve::from_columns(vec![480.0, 520.0], vec![50.0, 10.0], vec![10.0, em])
                .unwrap()
        };
        let profiles = vec![
            FluorophoreProfile::new("A", curve(80.0), &[480.0], &ch),
            FluorophoreProfile::new("B", curve(40.0), &[480.0], &ch),
            FluorophoreProfile::new("C", curve(20.0), &[480.0], &ch),
        ];

        let configured = ["A", "B", "C"].map(String::from);
        assert_eq!(
            RunMode::select(&configured, &profiles, &ch),
            RunMode::Ratio { first: 0, second: 1 }
        );
    }

    #[test]
    fn missing_pair_member_is_not_replaced_by_a_later_dye() {
        let dir = scratch_dir("pair-member-missing");
        std::fs::write(
            dir.join("settings.yml"),
            "fluo_list: [DyeA, DyeB, DyeC]\nex_list: [480]\nch_reg:\n  ch1: [500, 550]\n",
        )
        .unwrap();
        std::fs::write(dir.join("DyeA.csv"), "w,ex,em\n480,50,10\n520,10,80\n").unwrap();
        std::fs::write(dir.join("DyeC.csv"), "w,ex,em\n480,25,5\n520,5,40\n").unwrap();

        let session = Session::load(&dir.join("settings.yml"), None).unwrap();

        assert_eq!(session.mode, RunMode::View);
        assert!(session.report.is_none());
        let loaded: Vec<&str> = session.profiles.iter().map(|p| p.name()).collect();
        assert_eq!(loaded, ["DyeA", "DyeC"]);
        assert_eq!(session.failures[0].0, "DyeB");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
