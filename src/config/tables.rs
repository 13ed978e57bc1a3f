use super::defaults;
use super::models::{AppConfig, DeviceKind, LogLevel};
use crate::rendition::Spread;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    reader: ReaderConfig,
    #[serde(default)]
    translation: TranslationConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    keys: KeysConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            spread: tables.reader.spread,
            font_family: tables.reader.font_family,
            dark_mode: tables.reader.dark_mode,
            paragraphs_per_page: tables.reader.paragraphs_per_page,
            device: tables.reader.device,
            translation_enabled: tables.translation.enabled,
            translation_endpoint: tables.translation.endpoint,
            translation_target: tables.translation.target_language,
            translation_timeout_secs: tables.translation.timeout_secs,
            library_dir: tables.storage.library_dir,
            log_level: tables.logging.log_level,
            key_next_page: tables.keys.next_page,
            key_prev_page: tables.keys.prev_page,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            reader: ReaderConfig {
                spread: config.spread,
                font_family: config.font_family.clone(),
                dark_mode: config.dark_mode,
                paragraphs_per_page: config.paragraphs_per_page,
                device: config.device,
            },
            translation: TranslationConfig {
                enabled: config.translation_enabled,
                endpoint: config.translation_endpoint.clone(),
                target_language: config.translation_target.clone(),
                timeout_secs: config.translation_timeout_secs,
            },
            storage: StorageConfig {
                library_dir: config.library_dir.clone(),
            },
            keys: KeysConfig {
                next_page: config.key_next_page.clone(),
                prev_page: config.key_prev_page.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReaderConfig {
    #[serde(default = "defaults::default_spread")]
    spread: Spread,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_family: Option<String>,
    #[serde(default = "defaults::default_dark_mode")]
    dark_mode: bool,
    #[serde(default = "defaults::default_paragraphs_per_page")]
    paragraphs_per_page: usize,
    #[serde(default = "defaults::default_device")]
    device: DeviceKind,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            spread: defaults::default_spread(),
            font_family: None,
            dark_mode: defaults::default_dark_mode(),
            paragraphs_per_page: defaults::default_paragraphs_per_page(),
            device: defaults::default_device(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TranslationConfig {
    #[serde(default = "defaults::default_translation_enabled")]
    enabled: bool,
    #[serde(default = "defaults::default_translation_endpoint")]
    endpoint: String,
    #[serde(default = "defaults::default_translation_target")]
    target_language: String,
    #[serde(default = "defaults::default_translation_timeout_secs")]
    timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        TranslationConfig {
            enabled: defaults::default_translation_enabled(),
            endpoint: defaults::default_translation_endpoint(),
            target_language: defaults::default_translation_target(),
            timeout_secs: defaults::default_translation_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_library_dir")]
    library_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            library_dir: defaults::default_library_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_next_page")]
    next_page: String,
    #[serde(default = "defaults::default_key_prev_page")]
    prev_page: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            next_page: defaults::default_key_next_page(),
            prev_page: defaults::default_key_prev_page(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
