//! Decision-boundary configuration.
//!
//! A [`ThresholdConfig`] is validated once at construction so the scoring
//! math never sees an inverted or degenerate uncertainty band.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DETECTION_THRESHOLD: f64 = 0.5;
pub const DEFAULT_UNCERTAINTY_RANGE: f64 = 0.25;

/// Runtime threshold adjustments are clamped into this window.
pub const MIN_DETECTION_THRESHOLD: f64 = 0.1;
pub const MAX_DETECTION_THRESHOLD: f64 = 0.9;

/// Upper (exclusive) limit on the band half-width.
pub const MAX_UNCERTAINTY_RANGE: f64 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid threshold config: {0}")]
    InvalidConfig(String),
}

/// Center and half-width of the UNCERTAIN band.
///
/// Fields are private: every value in circulation has passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholdConfig")]
pub struct ThresholdConfig {
    detection_threshold: f64,
    uncertainty_range: f64,
}

#[derive(Deserialize)]
struct RawThresholdConfig {
    detection_threshold: f64,
    uncertainty_range: f64,
}

impl TryFrom<RawThresholdConfig> for ThresholdConfig {
    type Error = ConfigError;

    fn try_from(raw: RawThresholdConfig) -> Result<Self, Self::Error> {
        ThresholdConfig::new(raw.detection_threshold, raw.uncertainty_range)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            uncertainty_range: DEFAULT_UNCERTAINTY_RANGE,
        }
    }
}

impl ThresholdConfig {
    /// Build a validated config.
    ///
    /// Rejects non-finite values, a threshold outside
    /// [`MIN_DETECTION_THRESHOLD`, `MAX_DETECTION_THRESHOLD`], a negative
    /// range, a range of [`MAX_UNCERTAINTY_RANGE`] or more, and any pair whose
    /// lower bound is not strictly below its upper bound.
    pub fn new(detection_threshold: f64, uncertainty_range: f64) -> Result<Self, ConfigError> {
        if !detection_threshold.is_finite() {
            return Err(ConfigError::InvalidConfig(format!(
                "detection threshold must be finite, got {detection_threshold}"
            )));
        }
        if !(MIN_DETECTION_THRESHOLD..=MAX_DETECTION_THRESHOLD).contains(&detection_threshold) {
            return Err(ConfigError::InvalidConfig(format!(
                "detection threshold {detection_threshold} outside \
                 [{MIN_DETECTION_THRESHOLD}, {MAX_DETECTION_THRESHOLD}]"
            )));
        }
        validate_range(uncertainty_range)?;

        let config = Self {
            detection_threshold,
            uncertainty_range,
        };
        if config.lower_bound() >= config.upper_bound() {
            return Err(ConfigError::InvalidConfig(format!(
                "lower bound {} must be below upper bound {}",
                config.lower_bound(),
                config.upper_bound()
            )));
        }
        Ok(config)
    }

    /// Copy of this config with a new threshold, clamped into
    /// [`MIN_DETECTION_THRESHOLD`, `MAX_DETECTION_THRESHOLD`].
    ///
    /// The uncertainty range is kept. Only a non-finite input is an error.
    pub fn with_threshold(&self, detection_threshold: f64) -> Result<Self, ConfigError> {
        if !detection_threshold.is_finite() {
            return Err(ConfigError::InvalidConfig(format!(
                "detection threshold must be finite, got {detection_threshold}"
            )));
        }
        let clamped = detection_threshold.clamp(MIN_DETECTION_THRESHOLD, MAX_DETECTION_THRESHOLD);
        Self::new(clamped, self.uncertainty_range)
    }

    pub fn detection_threshold(&self) -> f64 {
        self.detection_threshold
    }

    pub fn uncertainty_range(&self) -> f64 {
        self.uncertainty_range
    }

    /// Inclusive lower edge of the UNCERTAIN band. May be negative when the
    /// threshold sits close to its minimum.
    pub fn lower_bound(&self) -> f64 {
        self.detection_threshold - self.uncertainty_range
    }

    /// Inclusive upper edge of the UNCERTAIN band. May exceed 1.0.
    pub fn upper_bound(&self) -> f64 {
        self.detection_threshold + self.uncertainty_range
    }
}

fn validate_range(uncertainty_range: f64) -> Result<(), ConfigError> {
    if !uncertainty_range.is_finite() {
        return Err(ConfigError::InvalidConfig(format!(
            "uncertainty range must be finite, got {uncertainty_range}"
        )));
    }
    if uncertainty_range < 0.0 {
        return Err(ConfigError::InvalidConfig(format!(
            "uncertainty range must not be negative, got {uncertainty_range}"
        )));
    }
    if uncertainty_range >= MAX_UNCERTAINTY_RANGE {
        return Err(ConfigError::InvalidConfig(format!(
            "uncertainty range must be below {MAX_UNCERTAINTY_RANGE}, got {uncertainty_range}"
        )));
    }
    Ok(())
}
