use crate::rendition::{Spread, Typography};
use serde::Deserialize;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_spread")]
    pub spread: Spread,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default = "crate::config::defaults::default_dark_mode")]
    pub dark_mode: bool,
    #[serde(default = "crate::config::defaults::default_paragraphs_per_page")]
    pub paragraphs_per_page: usize,
    #[serde(default = "crate::config::defaults::default_device")]
    pub device: DeviceKind,
    #[serde(default = "crate::config::defaults::default_translation_enabled")]
    pub translation_enabled: bool,
    #[serde(default = "crate::config::defaults::default_translation_endpoint")]
    pub translation_endpoint: String,
    #[serde(default = "crate::config::defaults::default_translation_target")]
    pub translation_target: String,
    #[serde(default = "crate::config::defaults::default_translation_timeout_secs")]
    pub translation_timeout_secs: u64,
    #[serde(default = "crate::config::defaults::default_library_dir")]
    pub library_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_key_next_page")]
    pub key_next_page: String,
    #[serde(default = "crate::config::defaults::default_key_prev_page")]
    pub key_prev_page: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            spread: crate::config::defaults::default_spread(),
            font_family: None,
            dark_mode: crate::config::defaults::default_dark_mode(),
            paragraphs_per_page: crate::config::defaults::default_paragraphs_per_page(),
            device: crate::config::defaults::default_device(),
            translation_enabled: crate::config::defaults::default_translation_enabled(),
            translation_endpoint: crate::config::defaults::default_translation_endpoint(),
            translation_target: crate::config::defaults::default_translation_target(),
            translation_timeout_secs: crate::config::defaults::default_translation_timeout_secs(),
            library_dir: crate::config::defaults::default_library_dir(),
            log_level: crate::config::defaults::default_log_level(),
            key_next_page: crate::config::defaults::default_key_next_page(),
            key_prev_page: crate::config::defaults::default_key_prev_page(),
        }
    }
}

impl AppConfig {
    pub fn typography(&self) -> Typography {
        Typography {
            spread: self.spread,
            font_family: self
                .font_family
                .as_deref()
                .map(str::trim)
                .filter(|family| !family.is_empty())
                .map(str::to_string),
            dark: self.dark_mode,
        }
    }
}

/// Primary input device; decides menu anchoring and tap zones.
#[derive(Debug, Clone, Copy, Default, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Pointer,
    Touch,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeviceKind::Pointer => "pointer",
            DeviceKind::Touch => "touch",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
