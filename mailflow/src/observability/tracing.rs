//! Logging setup and timing helpers built on `tracing`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info,mailflow=debug").
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Include the module target in each line.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Reads a config from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// When the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`LoggingConfig::filter`]. Returns false
/// when a global subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);
    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}

/// Span attributes for one operation run inside a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationSpanAttributes {
    /// Operation name.
    pub operation: String,
    /// Outcome ("completed" or "failed").
    pub status: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl OperationSpanAttributes {
    /// Creates new operation span attributes.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Flattens into dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("operation.name".to_string(), self.operation.clone());
        if let Some(ref v) = self.status {
            attrs.insert("operation.status".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("operation.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("operation.error".to_string(), v.clone());
        }
        attrs
    }

    /// JSON form used as an event payload.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::from_json(r#"{"json": true}"#).unwrap();
        assert!(config.json);
        assert_eq!(config.filter, "info");
        assert!(config.with_target);
    }

    #[test]
    fn test_logging_config_rejects_bad_json() {
        assert!(LoggingConfig::from_json("{").is_err());
    }

    #[test]
    fn test_init_logging_twice() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }

    #[test]
    fn test_operation_span_attributes() {
        let attrs = OperationSpanAttributes::new("get_subject")
            .with_status("completed")
            .with_duration_ms(12.5);

        let map = attrs.to_attributes();
        assert_eq!(map.get("operation.name"), Some(&"get_subject".to_string()));
        assert_eq!(map.get("operation.status"), Some(&"completed".to_string()));
        assert_eq!(map.get("operation.duration_ms"), Some(&"12.5".to_string()));
        assert_eq!(attrs.to_json()["operation"], "get_subject");
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("test_span");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "test_span");
        assert!(timer.finish() >= 10.0);
    }
}
