//! Configuration module for sdrvis-rs
//!
//! This module handles the persisted receiver settings:
//! - [`RadioConfig`] - every recognized setting, with defaults
//! - [`ConfigStore`] - where settings are loaded from and saved to
//! - [`entry`] - parsing and clamping of typed numeric entries
//!
//! # App Data Location
//!
//! The JSON store lives in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.sdrvis.sdrvis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.sdrvis.sdrvis-rs/`
//! - **Windows**: `%APPDATA%\dev.sdrvis.sdrvis-rs\`
//!
//! # Files
//!
//! - `radio_config.json` - settings saved after every user-driven change
//! - `*.toml` presets - written and read only on explicit export/import
//!
//! # Example
//!
//! ```ignore
//! use sdrvis_rs::config::{ConfigStore, JsonFileStore};
//!
//! let mut store = JsonFileStore::default_location()?;
//! let mut config = store.load_or_default();
//! config.frequency = 96.9e6;
//! store.save(&config)?;
//! ```

pub mod entry;

pub use entry::{parse_numeric_entry, NumericEntry, AUDIO_RATE_ENTRY};

use crate::display::mapping::clamp_zoom;
use crate::error::{Result, SdrError};
use crate::spectrum::FftWindow;
use crate::types::{Bandwidth, Mode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.sdrvis.sdrvis-rs";

/// Settings filename
pub const CONFIG_FILE: &str = "radio_config.json";

/// Default front-end sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 2.4e6;

/// Default audio rate in Hz
pub const DEFAULT_AUDIO_RATE: f64 = 48_000.0;

/// Default tuned frequency in Hz
pub const DEFAULT_FREQUENCY: f64 = 106.5e6;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir()
        .ok_or_else(|| SdrError::Config("Could not determine app data directory".to_string()))?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            SdrError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

// ==================== Radio Config ====================

/// Persisted receiver settings
///
/// Unknown keys are ignored and missing keys take their defaults, so files
/// written by older builds keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Version for future migration support
    pub version: u32,

    /// Demodulation mode
    pub mode: Mode,

    /// Requested front-end sample rate in Hz
    pub sample_rate: f64,

    /// Audio output rate in Hz
    pub audio_rate: f64,

    /// Tuned center frequency in Hz
    pub frequency: f64,

    /// Channel filter width
    pub bandwidth: Bandwidth,

    /// Analog front-end bandwidth in Hz, if one was picked
    pub front_end_bandwidth: Option<f64>,

    /// Bottom of the dB scale
    pub db_lo: f64,

    /// Top of the dB scale
    pub db_hi: f64,

    /// Spectrum zoom factor in `[0, 0.499]`
    pub zoom: f64,

    /// Squelch threshold in dB
    pub squelch_db: f64,

    /// Linear output gain
    pub volume: f32,

    /// Spectrum FFT length
    pub fft_size: usize,

    /// Spectrum frames per second
    pub frame_rate: u32,

    /// Taper applied before the spectrum FFT
    pub fft_window: FftWindow,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            version: 1,
            mode: Mode::Wfm,
            sample_rate: DEFAULT_SAMPLE_RATE,
            audio_rate: DEFAULT_AUDIO_RATE,
            frequency: DEFAULT_FREQUENCY,
            bandwidth: Bandwidth::Wide,
            front_end_bandwidth: None,
            db_lo: -140.0,
            db_hi: 10.0,
            zoom: 0.0,
            squelch_db: -130.0,
            volume: 0.6,
            fft_size: 4096,
            frame_rate: 60,
            fft_window: FftWindow::default(),
        }
    }
}

impl RadioConfig {
    /// Bring every field back into its valid range.
    ///
    /// Saved files may hold a negative zoom (meaning "unset") or an audio
    /// rate typed before the entry was clamped.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.zoom = clamp_zoom(self.zoom);
        self.audio_rate = AUDIO_RATE_ENTRY.clamp_f64(self.audio_rate);
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            self.sample_rate = defaults.sample_rate;
        }
        if !(self.db_lo.is_finite() && self.db_hi.is_finite() && self.db_lo < self.db_hi) {
            self.db_lo = defaults.db_lo;
            self.db_hi = defaults.db_hi;
        }
        if self.fft_size < 16 {
            self.fft_size = defaults.fft_size;
        }
        if self.frame_rate == 0 {
            self.frame_rate = defaults.frame_rate;
        }
        self
    }

    /// Serialize as a hand-editable TOML preset.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SdrError::Serialization(format!("Failed to serialize preset: {}", e)))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str::<Self>(text)
            .map(Self::sanitized)
            .map_err(|e| SdrError::Serialization(format!("Failed to parse preset: {}", e)))
    }

    /// Write a TOML preset to `path`.
    pub fn export_toml(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| {
            SdrError::Config(format!("Failed to write preset {:?}: {}", path, e))
        })
    }

    /// Read a TOML preset from `path`.
    pub fn import_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SdrError::Config(format!("Failed to read preset {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }
}

// ==================== Stores ====================

/// Where settings are kept between runs
pub trait ConfigStore: Send {
    fn load(&self) -> Result<RadioConfig>;

    fn save(&mut self, config: &RadioConfig) -> Result<()>;

    /// Load settings, returning defaults on any error
    fn load_or_default(&self) -> RadioConfig {
        self.load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load radio config, using defaults: {}", e);
            RadioConfig::default()
        })
    }
}

/// Settings stored as pretty-printed JSON in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(ensure_app_data_dir()?.join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<RadioConfig> {
        if !self.path.exists() {
            return Ok(RadioConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SdrError::Config(format!("Failed to read radio config: {}", e)))?;

        serde_json::from_str::<RadioConfig>(&content)
            .map(RadioConfig::sanitized)
            .map_err(|e| SdrError::Config(format!("Failed to parse radio config: {}", e)))
    }

    fn save(&mut self, config: &RadioConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SdrError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| SdrError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&self.path, content)
            .map_err(|e| SdrError::Config(format!("Failed to write radio config: {}", e)))
    }
}

/// In-memory store for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    stored: Option<RadioConfig>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RadioConfig) -> Self {
        Self {
            stored: Some(config),
            saves: 0,
        }
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<RadioConfig> {
        Ok(self.stored.clone().unwrap_or_default())
    }

    fn save(&mut self, config: &RadioConfig) -> Result<()> {
        self.stored = Some(config.clone());
        self.saves += 1;
        Ok(())
    }
}
