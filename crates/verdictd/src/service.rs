use crate::store::ThresholdStore;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use verdict_core::{
    ConfigError, FacesVerdict, ScoreError, TemporalResult, ThresholdConfig, VideoVerdict,
    FAKE_LABEL, REAL_LABEL,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Daemon state reported by `Status()`.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub version: &'static str,
    pub detection_threshold: f64,
    pub uncertainty_range: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub fake_label: f64,
    pub real_label: f64,
    pub requests_served: u64,
    pub uptime_secs: u64,
}

/// Request layer between the bus and the scoring functions.
///
/// Each call validates its scores, takes one threshold snapshot and scores
/// against it.
pub struct ScoringService {
    store: ThresholdStore,
    requests: AtomicU64,
    started: Instant,
}

impl ScoringService {
    pub fn new(store: ThresholdStore) -> Self {
        Self {
            store,
            requests: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn classify_faces(&self, scores: &[f64]) -> Result<FacesVerdict, ServiceError> {
        let config = self.begin(scores)?;
        let result = verdict_core::classify_faces(scores, &config)?;
        tracing::info!(
            faces = scores.len(),
            verdict = %result.verdict,
            confidence = result.confidence,
            "faces classified"
        );
        Ok(result)
    }

    /// An empty `frame_numbers` numbers the frames `0..n`.
    pub fn classify_temporal(
        &self,
        scores: &[f64],
        frame_numbers: &[u64],
    ) -> Result<TemporalResult, ServiceError> {
        let config = self.begin(scores)?;
        let result = if frame_numbers.is_empty() {
            verdict_core::classify_temporal_indexed(scores, &config)?
        } else {
            verdict_core::classify_temporal(scores, frame_numbers, &config)?
        };
        tracing::info!(
            frames = scores.len(),
            jumps = result.jumps.len(),
            verdict = %result.verdict,
            consistency = result.consistency_score,
            "temporal analysis done"
        );
        Ok(result)
    }

    pub fn classify_video(&self, scores: &[f64]) -> Result<VideoVerdict, ServiceError> {
        let config = self.begin(scores)?;
        let result = verdict_core::classify_video_sampled(scores, &config)?;
        tracing::info!(
            frames = scores.len(),
            verdict = %result.verdict,
            confidence = result.confidence,
            "video classified"
        );
        Ok(result)
    }

    /// Returns the config now in effect, with the threshold clamped.
    pub fn set_threshold(&self, threshold: f64) -> Result<ThresholdConfig, ServiceError> {
        let update = self.store.set_threshold(threshold)?;
        tracing::info!(
            requested = threshold,
            previous = update.previous.detection_threshold(),
            applied = update.applied.detection_threshold(),
            "detection threshold set"
        );
        Ok(update.applied)
    }

    pub fn status(&self) -> Status {
        let config = self.store.snapshot();
        Status {
            version: env!("CARGO_PKG_VERSION"),
            detection_threshold: config.detection_threshold(),
            uncertainty_range: config.uncertainty_range(),
            lower_bound: config.lower_bound(),
            upper_bound: config.upper_bound(),
            fake_label: FAKE_LABEL,
            real_label: REAL_LABEL,
            requests_served: self.requests.load(Ordering::Relaxed),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }

    fn begin(&self, scores: &[f64]) -> Result<ThresholdConfig, ServiceError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        verdict_core::validate_scores(scores)?;
        Ok(self.store.snapshot())
    }
}
