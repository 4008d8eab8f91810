//! Three-zone verdict scoring.
//!
//! Maps raw classifier scores to FAKE / REAL / UNCERTAIN with a confidence
//! percentage, for a single face, all faces of an image, the sampled frames
//! of a video, and the temporal statistics of a frame sequence.
//!
//! Every function here is pure: the caller hands in the [`ThresholdConfig`]
//! snapshot to score against.

use crate::config::ThresholdConfig;
use crate::types::{
    FaceVerdict, FacesVerdict, Jump, TemporalResult, Verdict, VideoVerdict, ZoneCounts,
};
use thiserror::Error;

/// Adjacent-frame score change above which a jump is recorded (strict).
pub const JUMP_DELTA: f64 = 0.3;

/// UNCERTAIN confidence never reaches 100.
pub const UNCERTAIN_CONFIDENCE_CAP: f64 = 99.9;

const MAX_CONFIDENCE: f64 = 100.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("cannot classify an empty {0} sequence")]
    EmptyInput(&'static str),
    #[error("{scores} scores but {frames} frame numbers")]
    LengthMismatch { scores: usize, frames: usize },
    #[error("score {value} at index {index} is not a probability in [0, 1]")]
    InvalidScore { index: usize, value: f64 },
}

/// Score band relative to the uncertainty bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Below `lower_bound`: FAKE.
    Below,
    /// Within `[lower_bound, upper_bound]`, edges included: UNCERTAIN.
    Band,
    /// Above `upper_bound`: REAL.
    Above,
}

impl Zone {
    pub fn of(raw_score: f64, config: &ThresholdConfig) -> Self {
        let lower = config.lower_bound();
        let upper = config.upper_bound();
        if lower <= raw_score && raw_score <= upper {
            Zone::Band
        } else if raw_score < lower {
            Zone::Below
        } else {
            Zone::Above
        }
    }

    pub fn verdict(self) -> Verdict {
        match self {
            Zone::Below => Verdict::Fake,
            Zone::Band => Verdict::Uncertain,
            Zone::Above => Verdict::Real,
        }
    }
}

/// Reject a score that is not a finite probability.
pub fn validate_score(index: usize, value: f64) -> Result<(), ScoreError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScoreError::InvalidScore { index, value })
    }
}

/// Reject anything that is not a finite probability.
pub fn validate_scores(scores: &[f64]) -> Result<(), ScoreError> {
    scores
        .iter()
        .enumerate()
        .try_for_each(|(index, &value)| validate_score(index, value))
}

/// Classify one raw score with the three-zone rule.
///
/// Inside the band, confidence grows linearly from 50 at the threshold to
/// the 99.9 cap at either edge. Outside it, confidence grows from 0 at the
/// band edge to 100 at the matching extreme (0.0 for FAKE, 1.0 for REAL).
pub fn classify_single(raw_score: f64, config: &ThresholdConfig) -> FaceVerdict {
    let zone = Zone::of(raw_score, config);
    let confidence = match zone {
        Zone::Band => {
            let distance = (raw_score - config.detection_threshold()).abs();
            (50.0 + distance / config.uncertainty_range() * 50.0).min(UNCERTAIN_CONFIDENCE_CAP)
        }
        Zone::Below => {
            let lower = config.lower_bound();
            if lower > 0.0 {
                ((lower - raw_score) / lower * 100.0).min(MAX_CONFIDENCE)
            } else {
                MAX_CONFIDENCE
            }
        }
        Zone::Above => {
            let upper = config.upper_bound();
            let denominator = 1.0 - upper;
            if denominator > 0.0 {
                ((raw_score - upper) / denominator * 100.0).min(MAX_CONFIDENCE)
            } else {
                MAX_CONFIDENCE
            }
        }
    };

    FaceVerdict {
        verdict: zone.verdict(),
        confidence,
        score: raw_score,
    }
}

/// Classify every face of an image and vote on an overall verdict.
///
/// UNCERTAIN wins when more than half the faces are uncertain; otherwise
/// FAKE needs strictly more faces than REAL, so ties go to REAL. The overall
/// confidence is the plain mean of the per-face confidences.
pub fn classify_faces(
    raw_scores: &[f64],
    config: &ThresholdConfig,
) -> Result<FacesVerdict, ScoreError> {
    if raw_scores.is_empty() {
        return Err(ScoreError::EmptyInput("face"));
    }

    let faces: Vec<FaceVerdict> = raw_scores
        .iter()
        .map(|&s| classify_single(s, config))
        .collect();

    let count = |v: Verdict| faces.iter().filter(|f| f.verdict == v).count();
    let fake_count = count(Verdict::Fake);
    let real_count = count(Verdict::Real);
    let uncertain_count = count(Verdict::Uncertain);

    let verdict = if uncertain_count as f64 > faces.len() as f64 / 2.0 {
        Verdict::Uncertain
    } else if fake_count > real_count {
        Verdict::Fake
    } else {
        Verdict::Real
    };

    let confidence = faces.iter().map(|f| f.confidence).sum::<f64>() / faces.len() as f64;

    tracing::debug!(
        faces = faces.len(),
        fake_count,
        real_count,
        uncertain_count,
        %verdict,
        confidence,
        "classified faces"
    );

    Ok(FacesVerdict {
        verdict,
        confidence,
        faces,
    })
}

/// Temporal statistics over a sequence of per-frame scores.
///
/// The overall verdict uses a two-zone comparison of the mean against the
/// detection threshold, so it is never UNCERTAIN. [`classify_video_sampled`]
/// applies the three-zone rule instead; both behaviours are relied upon.
pub fn classify_temporal(
    raw_scores: &[f64],
    frame_numbers: &[u64],
    config: &ThresholdConfig,
) -> Result<TemporalResult, ScoreError> {
    if raw_scores.is_empty() {
        return Err(ScoreError::EmptyInput("frame"));
    }
    if raw_scores.len() != frame_numbers.len() {
        return Err(ScoreError::LengthMismatch {
            scores: raw_scores.len(),
            frames: frame_numbers.len(),
        });
    }

    let mean = mean(raw_scores);
    let variance =
        raw_scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / raw_scores.len() as f64;

    let jumps: Vec<Jump> = raw_scores
        .windows(2)
        .zip(&frame_numbers[1..])
        .filter_map(|(pair, &frame)| {
            let change = (pair[1] - pair[0]).abs();
            (change > JUMP_DELTA).then_some(Jump { frame, change })
        })
        .collect();

    let verdict = if mean > config.detection_threshold() {
        Verdict::Fake
    } else {
        Verdict::Real
    };

    tracing::debug!(
        frames = raw_scores.len(),
        mean,
        variance,
        jumps = jumps.len(),
        %verdict,
        "temporal analysis"
    );

    Ok(TemporalResult {
        scores: raw_scores.to_vec(),
        frame_numbers: frame_numbers.to_vec(),
        mean,
        variance,
        jumps,
        verdict,
        consistency_score: 100.0 - variance * 100.0,
        frames_analyzed: raw_scores.len(),
    })
}

/// [`classify_temporal`] with frames numbered `0..n`.
pub fn classify_temporal_indexed(
    raw_scores: &[f64],
    config: &ThresholdConfig,
) -> Result<TemporalResult, ScoreError> {
    let frame_numbers: Vec<u64> = (0..raw_scores.len() as u64).collect();
    classify_temporal(raw_scores, &frame_numbers, config)
}

/// Whole-video verdict: the mean frame score goes through
/// [`classify_single`], and each frame is tallied into its zone.
pub fn classify_video_sampled(
    raw_scores: &[f64],
    config: &ThresholdConfig,
) -> Result<VideoVerdict, ScoreError> {
    if raw_scores.is_empty() {
        return Err(ScoreError::EmptyInput("frame"));
    }

    let mean_score = mean(raw_scores);
    let overall = classify_single(mean_score, config);

    let mut zone_counts = ZoneCounts::default();
    for &score in raw_scores {
        match Zone::of(score, config) {
            Zone::Below => zone_counts.fake_frames += 1,
            Zone::Band => zone_counts.uncertain_frames += 1,
            Zone::Above => zone_counts.real_frames += 1,
        }
    }

    tracing::debug!(
        frames = raw_scores.len(),
        mean_score,
        verdict = %overall.verdict,
        confidence = overall.confidence,
        "classified video"
    );

    Ok(VideoVerdict {
        verdict: overall.verdict,
        confidence: overall.confidence,
        mean_score,
        frames_analyzed: raw_scores.len(),
        zone_counts,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
