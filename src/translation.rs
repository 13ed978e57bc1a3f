//! Translation of the current selection.
//!
//! [`TranslationBridge`] keeps at most one request in flight per menu. Texts
//! that arrive while a request is outstanding replace each other in a single
//! pending slot; when the outstanding request settles the newest pending text
//! is sent next. A result that settles while a newer text is pending is
//! dropped so the panel never shows a translation of stale text.

use crate::config::AppConfig;
use crate::dom::decode_entities;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct TranslationBridge {
    next_id: u64,
    in_flight: Option<TranslationRequest>,
    pending: Option<String>,
    translation: Option<String>,
}

impl TranslationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `text` to be translated. Returns the request to send now, or
    /// `None` when it was queued behind the outstanding one.
    pub fn request(&mut self, text: impl Into<String>) -> Option<TranslationRequest> {
        let text = text.into();
        if self.in_flight.is_some() {
            if let Some(superseded) = self.pending.replace(text) {
                debug!(chars = superseded.len(), "Superseded pending translation");
            }
            return None;
        }
        Some(self.dispatch(text))
    }

    fn dispatch(&mut self, text: String) -> TranslationRequest {
        self.next_id += 1;
        let request = TranslationRequest {
            id: self.next_id,
            text,
        };
        self.in_flight = Some(request.clone());
        request
    }

    /// Record the outcome of request `id`; returns the pending request to
    /// send next, if any.
    pub fn settle(&mut self, id: u64, result: Result<String, String>) -> Option<TranslationRequest> {
        if self.in_flight.as_ref().map(|request| request.id) != Some(id) {
            debug!(id, "Ignoring result for a request that is not in flight");
            return None;
        }
        self.in_flight = None;
        let superseded = self.pending.is_some();
        match result {
            Ok(_) if superseded => debug!(id, "Dropping translation of superseded text"),
            Ok(output) => self.translation = Some(decode_entities(&output)),
            Err(err) => warn!(id, "Translation request failed: {err}"),
        }
        self.pending.take().map(|text| self.dispatch(text))
    }

    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.translation.is_none()
    }

    pub fn in_flight(&self) -> Option<&TranslationRequest> {
        self.in_flight.as_ref()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}

#[derive(Deserialize)]
struct TranslationPayload {
    output: String,
}

/// Translator backed by an HTTP endpoint that answers `{"output": ...}`.
pub struct HttpTranslator {
    client: reqwest::blocking::Client,
    endpoint: Url,
    target_language: String,
}

impl HttpTranslator {
    pub fn new(endpoint: &str, target_language: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid translation endpoint `{endpoint}`"))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build translation HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            target_language: target_language.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.translation_endpoint,
            &config.translation_target,
            Duration::from_secs(config.translation_timeout_secs),
        )
    }

    pub fn request_url(&self, text: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("text", text)
            .append_pair("target", &self.target_language);
        url
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str) -> Result<String> {
        let url = self.request_url(text);
        debug!(chars = text.len(), "Requesting translation");
        let body = self
            .client
            .get(url)
            .send()
            .context("Translation request failed")?
            .error_for_status()
            .context("Translation endpoint returned an error")?
            .text()
            .context("Failed to read translation response")?;
        let payload: TranslationPayload =
            serde_json::from_str(&body).context("Translation response is not valid JSON")?;
        Ok(payload.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queues_behind_the_in_flight_request() {
        let mut bridge = TranslationBridge::new();
        let first = bridge.request("A").unwrap();
        assert!(bridge.request("B").is_none());
        assert!(bridge.request("C").is_none());
        assert_eq!(bridge.pending(), Some("C"));

        let next = bridge.settle(first.id, Ok("a".to_string())).unwrap();
        assert_eq!(next.text, "C");
        assert!(bridge.is_loading());

        assert!(bridge.settle(next.id, Ok("c".to_string())).is_none());
        assert_eq!(bridge.translation(), Some("c"));
        assert!(bridge.in_flight().is_none());
    }

    #[test]
    fn decodes_entities_in_results() {
        let mut bridge = TranslationBridge::new();
        let request = bridge.request("bonjour").unwrap();
        bridge.settle(request.id, Ok("&amp;bonjour&amp;".to_string()));
        assert_eq!(bridge.translation(), Some("&bonjour&"));
    }

    #[test]
    fn failure_still_sends_the_pending_text() {
        let mut bridge = TranslationBridge::new();
        let first = bridge.request("A").unwrap();
        bridge.request("B");
        let next = bridge.settle(first.id, Err("timeout".to_string())).unwrap();
        assert_eq!(next.text, "B");
        assert!(bridge.translation().is_none());
    }

    #[test]
    fn stale_ids_are_ignored() {
        let mut bridge = TranslationBridge::new();
        let request = bridge.request("A").unwrap();
        assert!(bridge.settle(request.id + 7, Ok("x".to_string())).is_none());
        assert!(bridge.in_flight().is_some());
    }

    #[test]
    fn request_url_appends_text_and_target() {
        let translator = HttpTranslator::new(
            "http://127.0.0.1:8080/cgi-bin/fluduku.py?keyword=bone",
            "en",
            Duration::from_secs(5),
        )
        .unwrap();
        let url = translator.request_url("a b&c");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/cgi-bin/fluduku.py?keyword=bone&text=a+b%26c&target=en"
        );
    }
}
