//! Scoring many media files in one request.
//!
//! Each file is routed to image or whole-video scoring by its extension.
//! A file that cannot be scored records its own error and the rest of the
//! batch carries on.

use crate::compare::Summary;
use crate::config::ThresholdConfig;
use crate::sampling::MediaKind;
use crate::scorer::{classify_faces, classify_video_sampled, validate_scores, ScoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Score one file's raw classifier output by its media kind.
///
/// Image scores are per-face, video scores are per sampled frame.
pub fn summarize(
    name: impl Into<String>,
    scores: &[f64],
    config: &ThresholdConfig,
) -> Result<Summary, BatchError> {
    let name = name.into();
    let kind =
        MediaKind::from_path(&name).ok_or_else(|| BatchError::UnsupportedFormat(name.clone()))?;
    validate_scores(scores)?;
    match kind {
        MediaKind::Image => Ok(Summary::from_image(name, &classify_faces(scores, config)?)),
        MediaKind::Video => Ok(Summary::from_video(name, &classify_video_sampled(scores, config)?)),
    }
}

/// Per-file outcome, serialised either as a summary or as `{name, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Scored(Summary),
    Failed { name: String, error: String },
}

impl BatchEntry {
    pub fn name(&self) -> &str {
        match self {
            BatchEntry::Scored(summary) => &summary.name,
            BatchEntry::Failed { name, .. } => name,
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            BatchEntry::Scored(summary) => Some(summary),
            BatchEntry::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BatchEntry>,
    /// Entries in `results`, failures included.
    pub total_processed: usize,
}

/// Score every `(name, scores)` item against one config snapshot.
///
/// Items with an empty name are skipped without an entry.
pub fn batch<I, N, S>(items: I, config: &ThresholdConfig) -> BatchReport
where
    I: IntoIterator<Item = (N, S)>,
    N: Into<String>,
    S: AsRef<[f64]>,
{
    let results: Vec<BatchEntry> = items
        .into_iter()
        .map(|(name, scores)| (name.into(), scores))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, scores)| match summarize(name.clone(), scores.as_ref(), config) {
            Ok(summary) => BatchEntry::Scored(summary),
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "batch item failed");
                BatchEntry::Failed {
                    name,
                    error: err.to_string(),
                }
            }
        })
        .collect();

    tracing::debug!(total = results.len(), "batch scored");
    BatchReport {
        total_processed: results.len(),
        results,
    }
}
