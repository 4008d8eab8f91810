use verdict_core::config::{DEFAULT_DETECTION_THRESHOLD, DEFAULT_UNCERTAINTY_RANGE};
use verdict_core::{ConfigError, ThresholdConfig};

/// Which message bus the daemon registers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    Session,
    System,
}

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Initial center of the decision boundary. Runtime changes are not
    /// persisted; a restart returns to this value.
    pub detection_threshold: f64,
    /// Half-width of the UNCERTAIN band, fixed for the daemon's lifetime.
    pub uncertainty_range: f64,
    pub bus: BusKind,
}

impl Config {
    /// Load configuration from `VERDICT_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bus = match lookup("VERDICT_BUS").as_deref() {
            Some("system") => BusKind::System,
            _ => BusKind::Session,
        };

        Self {
            detection_threshold: parse_f64(
                &lookup,
                "VERDICT_DETECTION_THRESHOLD",
                DEFAULT_DETECTION_THRESHOLD,
            ),
            uncertainty_range: parse_f64(
                &lookup,
                "VERDICT_UNCERTAINTY_RANGE",
                DEFAULT_UNCERTAINTY_RANGE,
            ),
            bus,
        }
    }

    /// Validated scoring config. An invalid pair aborts startup.
    pub fn threshold_config(&self) -> Result<ThresholdConfig, ConfigError> {
        ThresholdConfig::new(self.detection_threshold, self.uncertainty_range)
    }
}

fn parse_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "unparseable value; using default");
            default
        }),
        None => default,
    }
}
