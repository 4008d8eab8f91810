//! Side-by-side comparison of two analysed media files.

use crate::sampling::MediaKind;
use crate::types::{FacesVerdict, Verdict, VideoVerdict};
use serde::{Deserialize, Serialize};

/// Overall outcome of one analysed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    pub kind: MediaKind,
    pub verdict: Verdict,
    pub confidence: f64,
    /// Zero for videos.
    pub faces_detected: usize,
    /// Zero for images.
    pub frames_analyzed: usize,
}

impl Summary {
    pub fn from_image(name: impl Into<String>, result: &FacesVerdict) -> Self {
        Self {
            name: name.into(),
            kind: MediaKind::Image,
            verdict: result.verdict,
            confidence: result.confidence,
            faces_detected: result.faces.len(),
            frames_analyzed: 0,
        }
    }

    pub fn from_video(name: impl Into<String>, result: &VideoVerdict) -> Self {
        Self {
            name: name.into(),
            kind: MediaKind::Video,
            verdict: result.verdict,
            confidence: result.confidence,
            faces_detected: 0,
            frames_analyzed: result.frames_analyzed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub first: Summary,
    pub second: Summary,
    pub confidence_difference: f64,
    pub verdict_match: bool,
    pub both_uncertain: bool,
    pub summary: String,
}

pub fn compare(first: Summary, second: Summary) -> Comparison {
    let summary = format!(
        "{}: {} ({:.1}%), {}: {} ({:.1}%)",
        first.name, first.verdict, first.confidence, second.name, second.verdict, second.confidence
    );
    Comparison {
        confidence_difference: (first.confidence - second.confidence).abs(),
        verdict_match: first.verdict == second.verdict,
        both_uncertain: first.verdict == Verdict::Uncertain && second.verdict == Verdict::Uncertain,
        summary,
        first,
        second,
    }
}
