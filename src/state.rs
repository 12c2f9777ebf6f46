use std::path::Path;

use crate::scene::PlotScene;
use crate::session::Session;
use crate::settings::{LoadPolicy, PlotStyle};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded session (None until a settings file is opened).
    pub session: Option<Session>,

    /// Drawable scene for the current session (cached).
    pub scene: PlotScene,

    /// Load policy given on the command line, overrides the settings file.
    pub policy_override: Option<LoadPolicy>,

    /// Plot layer toggles.
    pub show_emission: bool,
    pub show_excitation: bool,
    pub show_channels: bool,
    pub show_lasers: bool,

    /// Visuals need to be re-applied after a new session.
    pub style_dirty: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: None,
            scene: PlotScene::default(),
            policy_override: None,
            show_emission: true,
            show_excitation: true,
            show_channels: true,
            show_lasers: true,
            style_dirty: true,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded session and rebuild the scene.
    pub fn set_session(&mut self, session: Session) {
        self.scene = PlotScene::build(&session);
        self.status_message = (!session.failures.is_empty()).then(|| {
            let names: Vec<&str> = session.failures.iter().map(|(n, _)| n.as_str()).collect();
            format!("Not loaded: {}", names.join(", "))
        });
        self.session = Some(session);
        self.style_dirty = true;
    }

    /// Load a settings file, keeping the previous session on failure.
    pub fn load_settings(&mut self, path: &Path) {
        match Session::load(path, self.policy_override) {
            Ok(session) => {
                log::info!(
                    "Loaded {} fluorophore(s) from {}",
                    session.profiles.len(),
                    path.display()
                );
                session.log_report();
                self.set_session(session);
            }
            Err(e) => {
                log::error!("Failed to load settings: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Load the current settings file again, picking up edited tables.
    pub fn reload(&mut self) {
        let path = self
            .session
            .as_ref()
            .and_then(|s| s.settings_path.clone());
        if let Some(path) = path {
            self.load_settings(&path);
        }
    }

    /// Presentation settings of the current session, defaults otherwise.
    pub fn plot_style(&self) -> PlotStyle {
        self.session
            .as_ref()
            .map(|s| s.settings.plot.clone())
            .unwrap_or_default()
    }
}
