//! Human-readable output.

use std::fmt::Write;
use verdict_core::batch::{BatchEntry, BatchReport};
use verdict_core::compare::Comparison;
use verdict_core::{FacesVerdict, TemporalResult, VideoVerdict};

pub fn faces(result: &FacesVerdict) -> String {
    let mut out = format!(
        "Overall: {} ({:.1}%), {} face(s)\n",
        result.verdict,
        result.confidence,
        result.faces.len()
    );
    for (i, face) in result.faces.iter().enumerate() {
        let _ = writeln!(
            out,
            "  face {}: {} {:.1}% (score {:.4})",
            i + 1,
            face.verdict,
            face.confidence,
            face.score
        );
    }
    out
}

pub fn temporal(result: &TemporalResult) -> String {
    let mut out = format!(
        "Overall: {} (mean {:.4} over {} frame(s))\n\
         Variance: {:.4}\n\
         Consistency: {:.1}\n",
        result.verdict,
        result.mean,
        result.frames_analyzed,
        result.variance,
        result.consistency_score
    );
    if result.jumps.is_empty() {
        out.push_str("No inconsistency jumps\n");
    } else {
        out.push_str("Jumps:\n");
        for jump in &result.jumps {
            let _ = writeln!(out, "  frame {}: change {:.4}", jump.frame, jump.change);
        }
    }
    out
}

pub fn video(result: &VideoVerdict) -> String {
    format!(
        "Overall: {} ({:.1}%)\n\
         Mean score: {:.4} over {} frame(s)\n\
         Frames: {} fake, {} uncertain, {} real\n",
        result.verdict,
        result.confidence,
        result.mean_score,
        result.frames_analyzed,
        result.zone_counts.fake_frames,
        result.zone_counts.uncertain_frames,
        result.zone_counts.real_frames
    )
}

pub fn comparison(result: &Comparison) -> String {
    format!(
        "{}\n\
         Confidence difference: {:.1}\n\
         Verdicts match: {}\n\
         Both uncertain: {}\n",
        result.summary, result.confidence_difference, result.verdict_match, result.both_uncertain
    )
}

pub fn batch(report: &BatchReport) -> String {
    let mut out = format!("Processed {} file(s)\n", report.total_processed);
    for entry in &report.results {
        let _ = match entry {
            BatchEntry::Scored(summary) => writeln!(
                out,
                "  {}: {} ({:.1}%)",
                summary.name, summary.verdict, summary.confidence
            ),
            BatchEntry::Failed { name, error } => writeln!(out, "  {name}: error: {error}"),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{classify_faces, classify_temporal_indexed, ThresholdConfig};

    #[test]
    fn test_faces_lists_each_face() {
        let result = classify_faces(&[0.1, 0.9], &ThresholdConfig::default()).unwrap();
        let text = faces(&result);
        assert!(text.starts_with("Overall: REAL"), "{text}");
        assert!(text.contains("face 1: FAKE 60.0%"), "{text}");
        assert!(text.contains("face 2: REAL"), "{text}");
    }

    #[test]
    fn test_temporal_without_jumps() {
        let result = classify_temporal_indexed(&[0.5, 0.55], &ThresholdConfig::default()).unwrap();
        let text = temporal(&result);
        assert!(text.contains("No inconsistency jumps"), "{text}");
        assert!(text.starts_with("Overall: FAKE"), "{text}");
    }

    #[test]
    fn test_batch_lists_failures_inline() {
        let report = verdict_core::batch::batch(
            [("a.jpg", vec![0.5]), ("b.txt", vec![0.5])],
            &ThresholdConfig::default(),
        );
        let text = batch(&report);
        assert!(text.starts_with("Processed 2 file(s)"), "{text}");
        assert!(text.contains("a.jpg: UNCERTAIN (50.0%)"), "{text}");
        assert!(text.contains("b.txt: error: unsupported file format"), "{text}");
    }
}
