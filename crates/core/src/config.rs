use std::collections::BTreeMap;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cue::{CueAssets, CueId};
use crate::output::artnet::{ArtNetMode, ARTNET_PORT};
use crate::program::RockinSource;
use crate::show::DEFAULT_FADE_OUT_MS;

/// Show settings persisted in the config file. Fields missing from an older
/// file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowSettings {
    pub fixture_count: usize,
    pub tick_hz: u32,
    pub online_mode: bool,
    pub link_device: PathBuf,
    pub music_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub songs: BTreeMap<CueId, PathBuf>,
    pub rockin_source: RockinSource,
    pub fade_out_ms: u64,

    // Art-Net output
    pub artnet_enabled: bool,
    /// Unicast target, broadcast when unset.
    pub artnet_dest_ip: Option<IpAddr>,
    pub artnet_port: u16,
    pub artnet_universe: u8,
}

impl Default for ShowSettings {
    fn default() -> Self {
        Self {
            fixture_count: 38,
            tick_hz: 20,
            online_mode: true,
            link_device: PathBuf::from("/dev/ttyUSB0"),
            music_dir: PathBuf::from("music"),
            assets_dir: PathBuf::from("assets"),
            songs: BTreeMap::new(),
            rockin_source: RockinSource::default(),
            fade_out_ms: DEFAULT_FADE_OUT_MS,
            artnet_enabled: true,
            artnet_dest_ip: None,
            artnet_port: ARTNET_PORT,
            artnet_universe: 0,
        }
    }
}

impl ShowSettings {
    /// Points every cue without a song, or with one outside `music_dir`, at
    /// the default file name in `music_dir`. Returns true if anything changed.
    pub fn autofill_songs(&mut self) -> bool {
        let mut changed = false;
        for cue in CueId::all() {
            let want = self.music_dir.join(cue.default_file_name());
            let keep = self
                .songs
                .get(&cue)
                .is_some_and(|path| path.parent() == Some(self.music_dir.as_path()));
            if !keep {
                self.songs.insert(cue, want);
                changed = true;
            }
        }
        changed
    }

    pub fn cue_assets(&self) -> CueAssets {
        CueAssets::new(self.songs.clone(), Some(self.assets_dir.clone()))
    }

    pub fn artnet_mode(&self) -> ArtNetMode {
        match self.artnet_dest_ip {
            Some(ip) => ArtNetMode::Unicast((ip, self.artnet_port).into()),
            None => ArtNetMode::Broadcast(self.artnet_port),
        }
    }

    /// Creates the music and assets directories if they are missing.
    pub fn ensure_dirs(&self) {
        for dir in [&self.music_dir, &self.assets_dir] {
            if let Err(e) = fs::create_dir_all(dir) {
                log::warn!("Cannot create {}: {}", dir.display(), e);
            }
        }
    }
}

/// Configuration manager for show settings.
/// Settings are stored in config.json in the working directory by default.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: ShowSettings,
}

/// Configuration option with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOption<T> {
    pub default: T,
    pub valid_range: Option<(T, T)>,
    pub description: String,
    pub requires_restart: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub fixture_count: ConfigOption<usize>,
    pub tick_hz: ConfigOption<u32>,
    pub fade_out_ms: ConfigOption<u64>,
    pub artnet_port: ConfigOption<u16>,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: ShowSettings,
    pub created_at: String,
    pub modified_at: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    /// If no path is provided, defaults to 'config.json' in the current working directory
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));

        let mut settings = ShowSettings::default();
        settings.autofill_songs();
        Self {
            config_path,
            settings,
        }
    }

    /// Load settings from the configuration file, writing a default file
    /// when none exists. Song paths are autofilled and written back.
    pub fn load(&mut self) -> Result<ShowSettings, ConfigError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let mut config_file: ConfigFile =
            serde_json::from_str(content.trim_start_matches('\u{feff}'))
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}. Using defaults for new settings.",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        Self::validate_settings(&config_file.settings).map_err(ConfigError::ValidationError)?;

        let changed = config_file.settings.autofill_songs();
        self.settings = config_file.settings;
        if changed {
            log::info!("Song paths updated from {}", self.settings.music_dir.display());
            self.save()?;
        }
        Ok(self.settings.clone())
    }

    /// Like [`load`](Self::load), but any failure is logged and the
    /// defaults are used instead.
    pub fn load_or_default(&mut self) -> ShowSettings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "{} ({}), using default settings",
                    e,
                    self.config_path.display()
                );
                self.settings = ShowSettings::default();
                self.settings.autofill_songs();
                self.settings.clone()
            }
        }
    }

    /// Save current settings to configuration file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: self.created_at().unwrap_or_else(|| now.clone()),
            modified_at: now,
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Creation time of the file on disk, so rewrites keep it.
    fn created_at(&self) -> Option<String> {
        let content = fs::read_to_string(&self.config_path).ok()?;
        let value: serde_json::Value = serde_json::from_str(&content).ok()?;
        value.get("created_at")?.as_str().map(str::to_string)
    }

    /// Update settings and save to file
    pub fn update_settings(&mut self, settings: ShowSettings) -> Result<(), ConfigError> {
        Self::validate_settings(&settings).map_err(ConfigError::ValidationError)?;
        self.settings = settings;
        self.save()
    }

    pub fn settings(&self) -> &ShowSettings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn schema() -> ConfigSchema {
        ConfigSchema {
            fixture_count: ConfigOption {
                default: 38,
                valid_range: Some((2, 170)),
                description: "Number of RGB fixtures on the strip (one DMX universe)".to_string(),
                requires_restart: true,
            },
            tick_hz: ConfigOption {
                default: 20,
                valid_range: Some((1, 120)),
                description: "Show update rate in ticks per second".to_string(),
                requires_restart: true,
            },
            fade_out_ms: ConfigOption {
                default: DEFAULT_FADE_OUT_MS,
                valid_range: Some((0, 10_000)),
                description: "Length of the quick fade-out in milliseconds".to_string(),
                requires_restart: false,
            },
            artnet_port: ConfigOption {
                default: ARTNET_PORT,
                valid_range: Some((1024, 65535)),
                description: "UDP port for Art-Net output".to_string(),
                requires_restart: true,
            },
        }
    }

    /// Validate settings against schema
    pub fn validate_settings(settings: &ShowSettings) -> Result<(), Vec<String>> {
        fn check<T: PartialOrd + std::fmt::Display>(
            errors: &mut Vec<String>,
            name: &str,
            value: T,
            option: &ConfigOption<T>,
        ) {
            if let Some((min, max)) = &option.valid_range {
                if value < *min || value > *max {
                    errors.push(format!("{} must be between {} and {}", name, min, max));
                }
            }
        }

        let mut errors = Vec::new();
        let schema = Self::schema();

        check(
            &mut errors,
            "fixture_count",
            settings.fixture_count,
            &schema.fixture_count,
        );
        check(&mut errors, "tick_hz", settings.tick_hz, &schema.tick_hz);
        check(
            &mut errors,
            "fade_out_ms",
            settings.fade_out_ms,
            &schema.fade_out_ms,
        );
        check(
            &mut errors,
            "artnet_port",
            settings.artnet_port,
            &schema.artnet_port,
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.settings = ShowSettings::default();
        self.settings.autofill_songs();
        self.save()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Failed to parse config file: {0}")]
    ParseError(String),
    #[error("Failed to serialize config: {0}")]
    SerializeError(String),
    #[error("Config validation errors: {}", .0.join(", "))]
    ValidationError(Vec<String>),
}
