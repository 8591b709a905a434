//! Configuration for the hover overlay.
//!
//! [`HoverConfig`] is a plain value passed by reference to whoever needs it.
//! Changes go through [`HoverConfig::update`] so every mutation is a named
//! [`ConfigUpdate`]. Only the enabled and pinned flags are persisted in the
//! browser, as [`PersistedFlags`].

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::keys::KeyBindings;

/// Log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// Convert to log crate's Level, used by loggers that take a single level.
    pub fn to_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration format version.
/// Increment this when making breaking changes to the format.
pub const CONFIG_VERSION: u32 = 1;

/// Settings for hover previews and the popout window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    /// Version of the configuration format
    pub version: u32,

    pub enabled: bool,
    /// Only preview while alt is held
    pub alt_only: bool,
    /// Ignore shortcuts while an editable field has focus
    pub ignore_while_typing: bool,

    pub hover_delay_ms: u32,
    pub hide_delay_ms: u32,

    /// Distance between pointer and overlay
    pub offset: f64,
    /// Space kept free at every viewport edge
    pub margin: f64,
    pub max_width_fraction: f64,
    pub max_height_fraction: f64,
    pub min_media_side: f64,

    pub zoom_step: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,

    /// Targets smaller than this on either side are skipped
    pub min_target_side: f64,

    pub popout_padding: f64,
    pub popout_min_width: f64,
    pub popout_min_height: f64,

    pub keybindings: KeyBindings,

    pub log_level: LogLevel,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            enabled: true,
            alt_only: false,
            ignore_while_typing: true,
            hover_delay_ms: constants::HOVER_DELAY_MS,
            hide_delay_ms: constants::HIDE_DELAY_MS,
            offset: constants::POINTER_OFFSET,
            margin: constants::VIEWPORT_MARGIN,
            max_width_fraction: constants::MAX_WIDTH_FRACTION,
            max_height_fraction: constants::MAX_HEIGHT_FRACTION,
            min_media_side: constants::MIN_MEDIA_SIDE,
            zoom_step: constants::ZOOM_STEP,
            zoom_min: constants::ZOOM_MIN,
            zoom_max: constants::ZOOM_MAX,
            min_target_side: constants::MIN_TARGET_SIDE,
            popout_padding: constants::POPOUT_PADDING,
            popout_min_width: constants::POPOUT_MIN_WIDTH,
            popout_min_height: constants::POPOUT_MIN_HEIGHT,
            keybindings: KeyBindings::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// A single named change to a [`HoverConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigUpdate {
    SetEnabled(bool),
    ToggleEnabled,
    SetAltOnly(bool),
    ToggleAltOnly,
    SetIgnoreWhileTyping(bool),
    SetDelays { hover_ms: u32, hide_ms: u32 },
    SetOffset(f64),
    SetMargin(f64),
    SetFitFractions { width: f64, height: f64 },
    SetZoomLimits { step: f64, min: f64, max: f64 },
    SetMinTargetSide(f64),
    SetPopoutPadding(f64),
    SetKeyBindings(KeyBindings),
    SetLogLevel(LogLevel),
}

impl HoverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `update`, keeping every value within a usable range.
    pub fn update(&mut self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::SetEnabled(enabled) => self.enabled = enabled,
            ConfigUpdate::ToggleEnabled => self.enabled = !self.enabled,
            ConfigUpdate::SetAltOnly(alt_only) => self.alt_only = alt_only,
            ConfigUpdate::ToggleAltOnly => self.alt_only = !self.alt_only,
            ConfigUpdate::SetIgnoreWhileTyping(ignore) => self.ignore_while_typing = ignore,
            ConfigUpdate::SetDelays { hover_ms, hide_ms } => {
                self.hover_delay_ms = hover_ms;
                self.hide_delay_ms = hide_ms;
            }
            ConfigUpdate::SetOffset(offset) => self.offset = non_negative(offset, self.offset),
            ConfigUpdate::SetMargin(margin) => self.margin = non_negative(margin, self.margin),
            ConfigUpdate::SetFitFractions { width, height } => {
                self.max_width_fraction = fraction(width, self.max_width_fraction);
                self.max_height_fraction = fraction(height, self.max_height_fraction);
            }
            ConfigUpdate::SetZoomLimits { step, min, max } => {
                if step.is_finite() && step > 0.0 && step < 1.0 && min.is_finite() && max.is_finite() && 0.0 < min && min <= max {
                    self.zoom_step = step;
                    self.zoom_min = min;
                    self.zoom_max = max;
                } else {
                    log::warn!("Ignoring invalid zoom limits step={} min={} max={}", step, min, max);
                }
            }
            ConfigUpdate::SetMinTargetSide(side) => self.min_target_side = non_negative(side, self.min_target_side),
            ConfigUpdate::SetPopoutPadding(padding) => self.popout_padding = non_negative(padding, self.popout_padding),
            ConfigUpdate::SetKeyBindings(bindings) => self.keybindings = bindings,
            ConfigUpdate::SetLogLevel(level) => self.log_level = level,
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "hoverzoom.json"
    }
}

fn non_negative(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

fn fraction(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        value
    } else {
        fallback
    }
}

/// The only state kept across page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedFlags {
    pub enabled: bool,
    pub pinned: bool,
}

impl Default for PersistedFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            pinned: false,
        }
    }
}

impl PersistedFlags {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse stored flags, falling back to defaults for anything unreadable.
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        match json.map(serde_json::from_str::<Self>) {
            Some(Ok(flags)) => flags,
            Some(Err(e)) => {
                log::warn!("Discarding unreadable stored flags: {}", e);
                Self::default()
            }
            None => Self::default(),
        }
    }
}

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Storage error (localStorage in the browser)
    #[error("Storage error: {0}")]
    StorageError(String),
}
