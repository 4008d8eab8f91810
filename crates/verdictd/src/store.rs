//! Process-wide threshold, swapped as a whole snapshot.

use std::sync::Arc;
use tokio::sync::watch;
use verdict_core::{ConfigError, ThresholdConfig};

/// Holds the current [`ThresholdConfig`].
///
/// Readers copy the full config out in one borrow, so a classification never
/// pairs a new threshold with a stale range. Writers replace the value under
/// the channel's lock.
#[derive(Clone)]
pub struct ThresholdStore {
    tx: Arc<watch::Sender<ThresholdConfig>>,
}

/// Outcome of one threshold write, both sides taken under the same lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdUpdate {
    pub previous: ThresholdConfig,
    pub applied: ThresholdConfig,
}

impl ThresholdStore {
    pub fn new(initial: ThresholdConfig) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Current config, copied out.
    pub fn snapshot(&self) -> ThresholdConfig {
        *self.tx.borrow()
    }

    /// Move the detection threshold, clamped to the allowed window.
    ///
    /// Returns the replaced config alongside the one now in effect.
    /// Observers are only woken when the value actually changed.
    pub fn set_threshold(&self, threshold: f64) -> Result<ThresholdUpdate, ConfigError> {
        let mut outcome = Err(ConfigError::InvalidConfig("threshold not applied".into()));
        self.tx.send_if_modified(|current| match current.with_threshold(threshold) {
            Ok(next) => {
                let previous = std::mem::replace(current, next);
                outcome = Ok(ThresholdUpdate {
                    previous,
                    applied: next,
                });
                previous != next
            }
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        outcome
    }

    /// Receiver notified on every threshold change.
    pub fn subscribe(&self) -> watch::Receiver<ThresholdConfig> {
        self.tx.subscribe()
    }
}
