//! Queue configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::QueueError;

/// Settings shared by `WorkQueue` and `TimeoutQueue`.
///
/// ```ignore
/// let config: QueueConfig = serde_json::from_str(r#"{ "max_concurrency": 1, "default_timeout_ms": 2000 }"#)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of tasks executing at once. `None` = unbounded.
    pub max_concurrency: Option<usize>,

    /// Timeout given to tasks submitted without an explicit one
    /// (TimeoutQueue only). Serialized in whole milliseconds; sub-millisecond
    /// precision is dropped.
    #[serde(rename = "default_timeout_ms", with = "opt_duration_ms")]
    pub default_timeout: Option<Duration>,
}

impl QueueConfig {
    /// Fail-fast check run by `QueueBuilder::build`.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.max_concurrency == Some(0) {
            return Err(QueueError::InvalidConfig(
                "max_concurrency must be at least 1 (use None for unbounded)".to_string(),
            ));
        }
        Ok(())
    }
}

mod opt_duration_ms {
    use std::time::Duration;

    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => {
                let ms = u64::try_from(d.as_millis()).map_err(S::Error::custom)?;
                s.serialize_some(&ms)
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_unbounded_and_untimed() {
        let config = QueueConfig::default();
        assert_eq!(config.max_concurrency, None);
        assert_eq!(config.default_timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_millisecond_timeout() {
        let config: QueueConfig =
            serde_json::from_str(r#"{ "max_concurrency": 1, "default_timeout_ms": 2000 }"#).unwrap();
        assert_eq!(config.max_concurrency, Some(1));
        assert_eq!(config.default_timeout, Some(Duration::from_secs(2)));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["default_timeout_ms"], 2000);
    }

    #[test]
    fn serializes_whole_milliseconds() {
        let config = QueueConfig {
            default_timeout: Some(Duration::from_micros(1_500)),
            ..QueueConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["default_timeout_ms"], 1);
    }

    #[test]
    fn oversized_timeout_fails_to_serialize() {
        let config = QueueConfig {
            default_timeout: Some(Duration::MAX),
            ..QueueConfig::default()
        };
        assert!(serde_json::to_string(&config).is_err());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: QueueConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, QueueConfig::default());
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(0), false)]
    #[case(Some(1), true)]
    #[case(Some(64), true)]
    fn validates_max_concurrency(#[case] max_concurrency: Option<usize>, #[case] ok: bool) {
        let config = QueueConfig {
            max_concurrency,
            ..QueueConfig::default()
        };
        assert_eq!(config.validate().is_ok(), ok);
    }
}
