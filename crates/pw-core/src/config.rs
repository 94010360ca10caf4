//! Configuration structures for pathwatch.
//!
//! - [`WatchConfig`] - Path watcher settings (poll interval, readiness delay, queue cap)
//! - [`LogConfig`] - Log output settings
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`], and missing fields fall back
//! to their defaults when deserializing.

use std::fmt;
use std::time::Duration;

use camino::Utf8Path;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::ConfigError;

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default pause after starting a watch, in milliseconds.
///
/// This only gives the background poll loop a head start. It is not a
/// readiness signal.
pub const DEFAULT_READINESS_DELAY_MS: u64 = 1000;

/// Configuration for a path watcher.
///
/// # Examples
///
/// ```
/// use pw_core::WatchConfig;
/// use std::time::Duration;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.poll_interval, Duration::from_secs(1));
/// assert_eq!(config.max_events, 1);
/// assert!(!config.recursive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How often the watch mechanism re-checks the path.
    ///
    /// Stored as `poll_interval_ms`; fractional milliseconds are kept.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,

    /// How long starting a watch pauses before returning.
    #[serde(rename = "readiness_delay_ms", with = "millis")]
    pub readiness_delay: Duration,

    /// Maximum number of queued events not yet consumed by the dispatch loop.
    ///
    /// Events produced while the queue is full are dropped.
    pub max_events: usize,

    /// Whether directory contents are tracked recursively.
    pub recursive: bool,

    /// Whether file contents are hashed on every poll.
    ///
    /// Modification times are only compared at one-second resolution, so
    /// without hashing two writes within the same second look unchanged.
    pub compare_contents: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            readiness_delay: Duration::from_millis(DEFAULT_READINESS_DELAY_MS),
            max_events: 1,
            recursive: false,
            compare_contents: true,
        }
    }
}

impl WatchConfig {
    /// Returns a copy with the poll interval replaced.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns a copy with the readiness delay replaced.
    #[must_use]
    pub const fn with_readiness_delay(mut self, delay: Duration) -> Self {
        self.readiness_delay = delay;
        self
    }

    /// Checks option ranges.
    ///
    /// A zero poll interval is not rejected here: starting the poll loop with
    /// it fails in the background, which is how the watcher reports it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::invalid_option(
                "watch.max_events",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Serde adapter storing a [`Duration`] as a number of milliseconds.
///
/// Whole milliseconds are written as integers and anything finer as a float.
mod millis {
    use super::{Deserializer, Duration, Serializer, de, fmt};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if duration.subsec_nanos() % 1_000_000 == 0 {
            serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        } else {
            #[allow(clippy::cast_precision_loss)]
            let nanos = duration.as_nanos() as f64;
            serializer.serialize_f64(nanos / 1_000_000.0)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_any(MillisVisitor)
    }

    struct MillisVisitor;

    impl de::Visitor<'_> for MillisVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative number of milliseconds")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
            Ok(Duration::from_millis(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
            u64::try_from(value)
                .map(Duration::from_millis)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Duration, E> {
            if value.is_finite() && value >= 0.0 {
                Ok(Duration::from_nanos((value * 1_000_000.0).round() as u64))
            } else {
                Err(E::invalid_value(de::Unexpected::Float(value), &self))
            }
        }
    }
}

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `info`, `debug`).
    pub level: String,

    /// Whether to emit ANSI colors.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            ansi: true,
        }
    }
}

/// Root configuration for pathwatch.
///
/// # Examples
///
/// ```
/// use pw_core::Config;
/// use std::time::Duration;
///
/// let config = Config::from_json_str(r#"{"watch": {"poll_interval_ms": 250}}"#).unwrap();
/// assert_eq!(config.watch.poll_interval, Duration::from_millis(250));
/// assert_eq!(config.watch.readiness_delay, Duration::from_secs(1));
/// assert_eq!(config.log.level, "info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path watcher configuration.
    pub watch: WatchConfig,

    /// Log configuration.
    pub log: LogConfig,
}

impl Config {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watch.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_watch_config_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.readiness_delay, Duration::from_secs(1));
        assert_eq!(config.max_events, 1);
        assert!(!config.recursive);
        assert!(config.compare_contents);
    }

    #[test]
    fn test_watch_config_builders() {
        let config = WatchConfig::default()
            .with_poll_interval(Duration::from_millis(50))
            .with_readiness_delay(Duration::ZERO);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.readiness_delay, Duration::ZERO);
    }

    #[test]
    fn test_sub_millisecond_interval_is_kept() {
        let config = WatchConfig::default().with_poll_interval(Duration::from_micros(500));
        assert_eq!(config.poll_interval, Duration::from_micros(500));

        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["poll_interval_ms"], serde_json::json!(0.5));

        let parsed: WatchConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.poll_interval, Duration::from_micros(500));
    }

    #[test]
    fn test_fractional_and_negative_millis() {
        let config = Config::from_json_str(r#"{"watch": {"poll_interval_ms": 2.5}}"#).unwrap();
        assert_eq!(config.watch.poll_interval, Duration::from_micros(2500));

        let err = Config::from_json_str(r#"{"watch": {"poll_interval_ms": -1}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_max_events_rejected() {
        let config = WatchConfig {
            max_events: 0,
            ..WatchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch.max_events"));
    }

    #[test]
    fn test_default_config_snapshot() {
        insta::assert_json_snapshot!(Config::default(), @r#"
        {
          "watch": {
            "poll_interval_ms": 1000,
            "readiness_delay_ms": 1000,
            "max_events": 1,
            "recursive": false,
            "compare_contents": true
          },
          "log": {
            "level": "info",
            "ansi": true
          }
        }
        "#);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let config = Config::from_json_str(r#"{"log": {"level": "debug"}}"#).unwrap();
        assert_eq!(config.log.level, "debug");
        assert!(config.log.ansi);
        assert_eq!(config.watch, WatchConfig::default());
    }

    #[test]
    fn test_config_rejects_invalid_json() {
        let err = Config::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("pathwatch.json")).unwrap();
        std::fs::write(&path, r#"{"watch": {"recursive": true}}"#).unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert!(config.watch.recursive);
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::from_json_file(Utf8Path::new("/nonexistent/pathwatch.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
