use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::types::{BaudRate, ConnectionMode};
pub const CONFIG_ENV: &str = "THERMOLOG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "thermolog.json";
pub const DEFAULT_CHANNELS: usize = 4;
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}
/// Recording parameters of one sensor channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Trial title written verbatim into the export.
    pub label: String,
    /// Minimum gap between accepted samples, in whole seconds.
    pub period_s: u32,
    /// Recording stops by itself after this many minutes.
    pub max_duration_min: u32,
}
impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            label: String::new(),
            period_s: 10,
            max_duration_min: 1,
        }
    }
}
impl ChannelSettings {
    pub fn period_secs(&self) -> f64 {
        self.period_s as f64
    }
    pub fn max_duration_secs(&self) -> f64 {
        self.max_duration_min as f64 * 60.0
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mode: ConnectionMode,
    pub port: Option<String>,
    pub baud: BaudRate,
    pub read_timeout_ms: u64,
    /// Foreground polling interval.
    pub tick_ms: u64,
    /// Seconds of history kept by the live plot.
    pub live_window_s: u32,
    pub export_dir: PathBuf,
    pub channels: Vec<ChannelSettings>,
}
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::Hardware,
            port: None,
            baud: BaudRate::default(),
            read_timeout_ms: 1000,
            tick_ms: 200,
            live_window_s: 600,
            export_dir: PathBuf::from("."),
            channels: vec![ChannelSettings::default(); DEFAULT_CHANNELS],
        }
    }
}
impl AppConfig {
    /// Settings path: `$THERMOLOG_CONFIG`, or `thermolog.json` in the
    /// working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
    /// Loads settings, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let mut config: AppConfig = serde_json::from_str(&text)?;
        config.normalize();
        Ok(config)
    }
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let result = fs::write(&tmp, json.as_bytes()).and_then(|()| fs::rename(&tmp, path));
        if result.is_err() {
            // Never leave a half-written sibling behind.
            let _ = fs::remove_file(&tmp);
        }
        result.map_err(io_err)
    }
    fn normalize(&mut self) {
        if self.channels.is_empty() {
            self.channels = vec![ChannelSettings::default(); DEFAULT_CHANNELS];
        }
        self.read_timeout_ms = self.read_timeout_ms.clamp(10, 10_000);
        self.tick_ms = self.tick_ms.clamp(20, 5_000);
        self.live_window_s = self.live_window_s.max(1);
    }
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
    pub fn labels(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.label.clone()).collect()
    }
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
