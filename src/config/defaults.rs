use super::models::{DeviceKind, LogLevel};
use crate::rendition::Spread;

pub(crate) fn default_spread() -> Spread {
    Spread::Auto
}

pub(crate) fn default_dark_mode() -> bool {
    false
}

pub(crate) fn default_paragraphs_per_page() -> usize {
    6
}

pub(crate) fn default_device() -> DeviceKind {
    DeviceKind::Pointer
}

pub(crate) fn default_translation_enabled() -> bool {
    true
}

pub(crate) fn default_translation_endpoint() -> String {
    "http://127.0.0.1:8080/cgi-bin/fluduku.py?keyword=bone".to_string()
}

pub(crate) fn default_translation_target() -> String {
    "en".to_string()
}

pub(crate) fn default_translation_timeout_secs() -> u64 {
    10
}

pub(crate) fn default_library_dir() -> String {
    ".library".to_string()
}

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Info
}

pub(crate) fn default_key_next_page() -> String {
    "arrowright, arrowdown, space".to_string()
}

pub(crate) fn default_key_prev_page() -> String {
    "arrowleft, arrowup, shift+space".to_string()
}
