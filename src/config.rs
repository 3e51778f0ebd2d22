//! Runtime configuration from `CARDIORISK_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{Coding, Strategy};
use crate::CardioriskError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_LOG_FILE: &str = "cardiorisk.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when attached to a terminal (the TUI owns the screen), stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Strategy selected at startup
    pub strategy: Strategy,
    /// Base URL of the prediction service, without trailing slash
    pub api_base_url: String,
    /// Request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Category coding the prediction service expects
    pub wire_coding: Coding,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategy: Strategy::Local,
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
            wire_coding: Coding::ZeroBased,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `CardioriskError::Config` for unparseable values.
    pub fn from_env() -> Result<Self, CardioriskError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Unset and empty variables fall back to defaults.
    ///
    /// # Errors
    /// Returns `CardioriskError::Config` for unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CardioriskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(v) = get("CARDIORISK_STRATEGY") {
            settings.strategy = v
                .parse()
                .map_err(|e| CardioriskError::Config(format!("CARDIORISK_STRATEGY: {e}")))?;
        }

        if let Some(v) = get("CARDIORISK_API_URL") {
            let url = v.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CardioriskError::Config(format!(
                    "CARDIORISK_API_URL must start with http:// or https://, got '{url}'"
                )));
            }
            settings.api_base_url = url;
        }

        if let Some(v) = get("CARDIORISK_TIMEOUT_SECS") {
            let secs: u64 = v.trim().parse().map_err(|_| {
                CardioriskError::Config(format!(
                    "CARDIORISK_TIMEOUT_SECS must be a whole number of seconds, got '{v}'"
                ))
            })?;
            settings.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(v) = get("CARDIORISK_WIRE_CODING") {
            settings.wire_coding = v
                .parse()
                .map_err(|e| CardioriskError::Config(format!("CARDIORISK_WIRE_CODING: {e}")))?;
        }

        if let Some(v) = get("CARDIORISK_LOG_MODE") {
            settings.log_mode = match v.trim().to_ascii_lowercase().as_str() {
                "auto" => LogMode::Auto,
                "file" => LogMode::File,
                "stdout" => LogMode::Stdout,
                other => {
                    return Err(CardioriskError::Config(format!(
                        "CARDIORISK_LOG_MODE must be auto, file or stdout, got '{other}'"
                    )))
                }
            };
        }

        if let Some(v) = get("CARDIORISK_LOG_FILE") {
            settings.log_file = PathBuf::from(v);
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).expect("Defaults are valid");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_base_url, "http://localhost:5000");
        assert_eq!(settings.wire_coding, Coding::ZeroBased);
        assert_eq!(settings.request_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("CARDIORISK_STRATEGY", "remote"),
            ("CARDIORISK_API_URL", "https://predict.example.com/"),
            ("CARDIORISK_TIMEOUT_SECS", "15"),
            ("CARDIORISK_WIRE_CODING", "cleveland"),
            ("CARDIORISK_LOG_MODE", "stdout"),
            ("CARDIORISK_LOG_FILE", "/tmp/c.log"),
        ]))
        .expect("Should parse");

        assert_eq!(settings.strategy, Strategy::Remote);
        assert_eq!(settings.api_base_url, "https://predict.example.com");
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(settings.wire_coding, Coding::Cleveland);
        assert_eq!(settings.log_mode, LogMode::Stdout);
        assert_eq!(settings.log_file, PathBuf::from("/tmp/c.log"));
    }

    #[test]
    fn test_zero_timeout_disables_timeout() {
        let settings = Settings::from_lookup(lookup(&[("CARDIORISK_TIMEOUT_SECS", "0")]))
            .expect("Should parse");
        assert_eq!(settings.request_timeout, None);
    }

    #[test]
    fn test_empty_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[("CARDIORISK_API_URL", "  ")]))
            .expect("Should parse");
        assert_eq!(settings.api_base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (key, value) in [
            ("CARDIORISK_STRATEGY", "ml"),
            ("CARDIORISK_API_URL", "localhost:5000"),
            ("CARDIORISK_TIMEOUT_SECS", "soon"),
            ("CARDIORISK_WIRE_CODING", "one-based"),
            ("CARDIORISK_LOG_MODE", "syslog"),
        ] {
            let err = Settings::from_lookup(lookup(&[(key, value)])).expect_err("Should fail");
            assert!(matches!(err, CardioriskError::Config(_)), "{key}");
        }
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
