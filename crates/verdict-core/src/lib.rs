//! verdict-core — Deepfake verdict scoring.
//!
//! Turns raw real-vs-fake classifier scores into FAKE / REAL / UNCERTAIN
//! verdicts with confidence percentages, for single faces, whole images,
//! sampled video frames and frame-to-frame consistency. Face location and
//! classification are plugged in through the [`pipeline`] traits.

pub mod batch;
pub mod compare;
pub mod config;
pub mod pipeline;
pub mod sampling;
pub mod scorer;
pub mod types;

pub use config::{ConfigError, ThresholdConfig};
pub use scorer::{
    classify_faces, classify_single, classify_temporal, classify_temporal_indexed,
    classify_video_sampled, validate_score, validate_scores, ScoreError,
};
pub use types::{
    BoundingBox, FaceResult, FaceVerdict, FacesVerdict, Jump, TemporalResult, Verdict,
    VideoVerdict, ZoneCounts, FAKE_LABEL, REAL_LABEL,
};
