use crate::models::Settings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the settings document inside the config directory
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Prefix of environment variables that override settings,
/// e.g. `GAMEDECK__SCREENSAVER__OMX_PLAYER=true`
pub const ENV_PREFIX: &str = "GAMEDECK";

/// Loads and saves front-end settings and locates per-system gamelists.
///
/// Layout of the config directory:
/// - `settings.yaml`: [`Settings`]
/// - `gamelists/<system>/gamelist.xml`: game metadata for one system
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager rooted at `config_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            config_dir,
        })
    }

    /// Load settings from `settings.yaml` with `GAMEDECK__*` environment overrides.
    ///
    /// A missing file is not an error: defaults are used, still subject to
    /// environment overrides.
    pub fn load_settings(&self) -> Result<Settings> {
        let settings: Settings = config::Config::builder()
            .add_source(
                config::File::new(self.settings_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Log where settings come from.
    ///
    /// Settings are read before the log directory is known, so the binary
    /// calls this once the subscriber is installed.
    ///
    /// # Returns
    /// `true` when `settings.yaml` exists, `false` when defaults are in use
    pub fn log_settings_source(&self) -> bool {
        if self.settings_path.exists() {
            tracing::info!("Using settings from {}", self.settings_path);
            true
        } else {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            false
        }
    }

    /// Save settings to `settings.yaml`.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Default gamelist location for `system`
    pub fn gamelist_path(&self, system: &str) -> Utf8PathBuf {
        self.config_dir.join("gamelists").join(system).join("gamelist.xml")
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameInfoMode, UiMode};
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = Utf8PathBuf::try_from(temp_dir.path().join("a").join("b")).unwrap();
        let manager = ConfigManager::new(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(manager.settings_path(), nested.join("settings.yaml"));
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        let settings = manager.load_settings().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_save_settings() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut settings = Settings::default();
        settings.favorites_first = false;
        settings.ui_mode = UiMode::Kiosk;
        settings.screensaver.game_info = GameInfoMode::StartAndEnd;
        settings.screensaver.set_swap_video_timeout_secs(45.0);
        manager.save_settings(&settings).unwrap();

        let loaded = manager.load_settings().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_settings_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.settings_path(), "ui_mode: kid\nscreensaver:\n  omx_player: true\n").unwrap();

        let loaded = manager.load_settings().unwrap();
        assert_eq!(loaded.ui_mode, UiMode::Kid);
        assert!(loaded.screensaver.omx_player);
        assert!(loaded.favorites_first);
        assert_eq!(loaded.screensaver.subtitle_size, 55);
    }

    #[test]
    fn test_gamelist_path() {
        let (manager, _temp_dir) = create_test_config_manager();
        let path = manager.gamelist_path("snes");
        assert!(path.ends_with("gamelists/snes/gamelist.xml"));
    }

    #[test]
    fn test_log_settings_source_reports_file_presence() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(!manager.log_settings_source());

        manager.save_settings(&Settings::default()).unwrap();
        assert!(manager.log_settings_source());
    }
}
