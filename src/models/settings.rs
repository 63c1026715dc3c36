use crate::gamelist::projector::{
    DEFAULT_FAVORITES_COLLECTION, DEFAULT_PLACEHOLDER_LABEL, LocaleMarkers, ProjectionOptions,
};
use crate::models::entry::DisplayFilter;
use serde::{Deserialize, Serialize};

/// Front-end settings from `settings.yaml`
///
/// Every field has a default, so partial files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Group favorites right after folders
    pub favorites_first: bool,

    pub show_hidden_files: bool,

    pub ui_mode: UiMode,

    /// Collection in which favorites are not grouped or starred
    pub favorites_collection: String,

    /// Substrings marking regional entries, checked in order
    pub locale_markers: Vec<String>,

    pub placeholder_label: String,

    pub quick_system_select: bool,

    pub screensaver: ScreensaverSettings,

    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            favorites_first: true,
            show_hidden_files: true,
            ui_mode: UiMode::Full,
            favorites_collection: DEFAULT_FAVORITES_COLLECTION.to_string(),
            locale_markers: LocaleMarkers::default().as_slice().to_vec(),
            placeholder_label: DEFAULT_PLACEHOLDER_LABEL.to_string(),
            quick_system_select: true,
            screensaver: ScreensaverSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Grouping options for list projection
    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            folders_first: true,
            favorites_first: self.favorites_first,
            favorites_collection: self.favorites_collection.clone(),
            locale_markers: LocaleMarkers::new(self.locale_markers.iter().cloned()),
            placeholder_label: self.placeholder_label.clone(),
        }
    }

    /// Which entries lists show in the current UI mode
    pub fn display_filter(&self) -> DisplayFilter {
        DisplayFilter {
            show_hidden: self.show_hidden_files,
            kid_mode: self.ui_mode == UiMode::Kid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    Full,
    Kiosk,
    Kid,
}

/// When the video screensaver overlays the game name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameInfoMode {
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "start & end")]
    StartAndEnd,
    #[serde(rename = "never")]
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleAlignment {
    Left,
    Center,
}

pub const SWAP_VIDEO_TIMEOUT_SECS_MIN: f32 = 10.0;
pub const SWAP_VIDEO_TIMEOUT_SECS_MAX: f32 = 1000.0;
pub const SUBTITLE_SIZE_MIN: u32 = 1;
pub const SUBTITLE_SIZE_MAX: u32 = 64;

/// Shown when a change makes the OMX player overlay game info, which
/// flickers on some TVs
pub const FLICKER_WARNING: &str = "Using the OMX player with game info shown can make some TVs flicker. \
If that happens:\n\n- turn off \"game info\", or\n- turn off overscan in the Raspberry Pi settings, or\n\
- stop using the OMX player for the screensaver.";

/// Video screensaver options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreensaverSettings {
    /// Time before switching to the next video, in milliseconds
    pub swap_video_timeout_ms: u32,
    pub stretch_video: bool,
    pub game_info: GameInfoMode,
    pub omx_player: bool,
    pub subtitle_alignment: SubtitleAlignment,
    pub subtitle_size: u32,
    pub subtitle_font: String,
    pub subtitle_italic_font: String,
    /// Render captions at a lower, widely supported resolution
    pub captions_compatibility: bool,
}

impl Default for ScreensaverSettings {
    fn default() -> Self {
        Self {
            swap_video_timeout_ms: 30_000,
            stretch_video: false,
            game_info: GameInfoMode::Never,
            omx_player: false,
            subtitle_alignment: SubtitleAlignment::Left,
            subtitle_size: 55,
            subtitle_font: String::new(),
            subtitle_italic_font: String::new(),
            captions_compatibility: true,
        }
    }
}

impl ScreensaverSettings {
    /// Swap timeout in whole seconds, as the options slider shows it
    pub fn swap_video_timeout_secs(&self) -> u32 {
        self.swap_video_timeout_ms / 1000
    }

    /// Store a slider value in seconds, clamped and rounded to whole seconds
    pub fn set_swap_video_timeout_secs(&mut self, secs: f32) {
        let secs = secs.clamp(SWAP_VIDEO_TIMEOUT_SECS_MIN, SWAP_VIDEO_TIMEOUT_SECS_MAX);
        self.swap_video_timeout_ms = secs.round() as u32 * 1000;
    }

    pub fn set_subtitle_size(&mut self, size: f32) {
        let size = size.round().clamp(SUBTITLE_SIZE_MIN as f32, SUBTITLE_SIZE_MAX as f32);
        self.subtitle_size = size as u32;
    }

    /// Game info drawn by the OMX player
    pub fn has_flicker_risk(&self) -> bool {
        self.game_info != GameInfoMode::Never && self.omx_player
    }

    /// Warning to show after saving `after` over `before`, only when the
    /// save is what introduced the risk
    pub fn flicker_warning(before: &Self, after: &Self) -> Option<&'static str> {
        if !before.has_flicker_risk() && after.has_flicker_risk() {
            tracing::warn!("Screensaver settings may cause flicker with the OMX player");
            Some(FLICKER_WARNING)
        } else {
            None
        }
    }
}

/// Where and how much to log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub file_prefix: String,
    pub debug: bool,
    pub console: bool,
    /// Write the log file as JSON lines
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "gamedeck".to_string(),
            debug: false,
            console: false,
            json: false,
        }
    }
}
