use crate::service::{ScoringService, ServiceError};
use serde::Serialize;
use zbus::interface;

pub const BUS_NAME: &str = "org.freedesktop.Verdict1";
pub const OBJECT_PATH: &str = "/org/freedesktop/Verdict1";

/// D-Bus interface for the Verdict scoring daemon.
///
/// Bus name: org.freedesktop.Verdict1
/// Object path: /org/freedesktop/Verdict1
///
/// Results are returned as JSON documents.
pub struct VerdictService {
    service: ScoringService,
}

impl VerdictService {
    pub fn new(service: ScoringService) -> Self {
        Self { service }
    }
}

#[interface(name = "org.freedesktop.Verdict1")]
impl VerdictService {
    /// Classify every face score of one image and aggregate the verdict.
    async fn classify_faces(&self, scores: Vec<f64>) -> zbus::fdo::Result<String> {
        tracing::debug!(count = scores.len(), "classify_faces requested");
        to_json(&self.service.classify_faces(&scores).map_err(invalid_args)?)
    }

    /// Temporal consistency over per-frame scores. Pass an empty
    /// `frame_numbers` to number frames from zero.
    async fn classify_temporal(
        &self,
        scores: Vec<f64>,
        frame_numbers: Vec<u64>,
    ) -> zbus::fdo::Result<String> {
        tracing::debug!(count = scores.len(), "classify_temporal requested");
        to_json(
            &self
                .service
                .classify_temporal(&scores, &frame_numbers)
                .map_err(invalid_args)?,
        )
    }

    /// Whole-video verdict from sampled frame scores.
    async fn classify_video(&self, scores: Vec<f64>) -> zbus::fdo::Result<String> {
        tracing::debug!(count = scores.len(), "classify_video requested");
        to_json(&self.service.classify_video(&scores).map_err(invalid_args)?)
    }

    /// Set the detection threshold. Returns the clamped value in effect.
    async fn set_threshold(&self, threshold: f64) -> zbus::fdo::Result<f64> {
        let applied = self.service.set_threshold(threshold).map_err(invalid_args)?;
        Ok(applied.detection_threshold())
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        to_json(&self.service.status())
    }
}

fn invalid_args(err: ServiceError) -> zbus::fdo::Error {
    tracing::warn!(error = %err, "request rejected");
    zbus::fdo::Error::InvalidArgs(err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> zbus::fdo::Result<String> {
    serde_json::to_string(value)
        .map_err(|e| zbus::fdo::Error::Failed(format!("encoding reply: {e}")))
}
