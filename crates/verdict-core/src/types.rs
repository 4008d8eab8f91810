use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw score emitted for a face the classifier considers fake.
///
/// The classifier was trained on class folders ordered alphabetically
/// (`fake`, `real`), so its sigmoid output leans toward 0.0 for fakes.
/// Retraining with a different class ordering inverts every verdict.
pub const FAKE_LABEL: f64 = 0.0;

/// Raw score emitted for a face the classifier considers real.
pub const REAL_LABEL: f64 = 1.0;

/// Categorical outcome for a face, an image or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Fake,
    Real,
    Uncertain,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Fake => "FAKE",
            Verdict::Real => "REAL",
            Verdict::Uncertain => "UNCERTAIN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounding box for a located face, in source-image pixels.
///
/// Locators may report an origin slightly outside the frame, hence the
/// signed coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Locator confidence in [0, 1].
    pub confidence: f32,
}

/// Verdict for a single face score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceVerdict {
    pub verdict: Verdict,
    /// Confidence percentage in [0, 100].
    pub confidence: f64,
    /// The raw score the verdict was derived from.
    pub score: f64,
}

/// A scored face located in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceResult {
    /// 1-based position in locator order.
    pub face_number: usize,
    pub bbox: BoundingBox,
    pub verdict: Verdict,
    pub confidence: f64,
    pub score: f64,
}

/// Aggregate verdict over every face of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacesVerdict {
    pub verdict: Verdict,
    /// Unweighted mean of the per-face confidences.
    pub confidence: f64,
    pub faces: Vec<FaceVerdict>,
}

/// An adjacent-frame score discontinuity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jump {
    /// Frame number of the later frame in the pair.
    pub frame: u64,
    /// Absolute score change from the previous sampled frame.
    pub change: f64,
}

/// Temporal statistics over the sampled frames of one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalResult {
    pub scores: Vec<f64>,
    pub frame_numbers: Vec<u64>,
    pub mean: f64,
    /// Population variance of `scores`.
    pub variance: f64,
    pub jumps: Vec<Jump>,
    /// Two-zone verdict on the mean; never `Uncertain`.
    pub verdict: Verdict,
    /// `100 - variance * 100`. Not clamped: highly erratic sequences go
    /// below zero.
    pub consistency_score: f64,
    pub frames_analyzed: usize,
}

/// Per-zone tally of individual frame scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCounts {
    pub fake_frames: usize,
    pub uncertain_frames: usize,
    pub real_frames: usize,
}

/// Whole-video verdict from the mean of the sampled frame scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoVerdict {
    pub verdict: Verdict,
    pub confidence: f64,
    pub mean_score: f64,
    pub frames_analyzed: usize,
    pub zone_counts: ZoneCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_convention() {
        assert!(FAKE_LABEL < REAL_LABEL);
        assert_eq!(FAKE_LABEL, 0.0);
        assert_eq!(REAL_LABEL, 1.0);
    }

    #[test]
    fn test_verdict_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Fake).unwrap(), "\"FAKE\"");
        assert_eq!(serde_json::to_string(&Verdict::Real).unwrap(), "\"REAL\"");
        assert_eq!(
            serde_json::to_string(&Verdict::Uncertain).unwrap(),
            "\"UNCERTAIN\""
        );
        let back: Verdict = serde_json::from_str("\"UNCERTAIN\"").unwrap();
        assert_eq!(back, Verdict::Uncertain);
    }

    #[test]
    fn test_verdict_display_matches_wire_name() {
        for v in [Verdict::Fake, Verdict::Real, Verdict::Uncertain] {
            assert_eq!(v.to_string(), v.as_str());
        }
    }
}
