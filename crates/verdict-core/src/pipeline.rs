//! Image and video analysis over pluggable face locators and classifiers.
//!
//! Locating faces and scoring crops are left to [`FaceLocator`] and
//! [`FaceScorer`] implementations; this module handles cropping,
//! preprocessing, frame sampling and hands the raw scores to the scorer
//! functions.

use crate::config::ThresholdConfig;
use crate::sampling::{crop_region, SamplingPlan, FACE_MARGIN};
use crate::scorer::{
    classify_faces, classify_temporal, classify_video_sampled, validate_score, ScoreError,
};
use crate::types::{BoundingBox, FaceResult, TemporalResult, Verdict, VideoVerdict};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of the square classifier input.
pub const CLASSIFIER_INPUT_SIZE: u32 = 64;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("face locator failed: {0}")]
    Locator(String),
    #[error("face classifier failed: {0}")]
    Scorer(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Finds faces in an RGB image.
pub trait FaceLocator {
    /// Bounding boxes in locator order. The first box is treated as the
    /// primary face wherever only one face per frame is used.
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, InferenceError>;
}

/// Binary real-vs-fake classifier over a preprocessed face crop.
pub trait FaceScorer {
    /// Probability in [0, 1]; values near [`crate::FAKE_LABEL`] mean fake,
    /// values near [`crate::REAL_LABEL`] mean real.
    fn score(&mut self, face: &Array4<f32>) -> Result<f64, InferenceError>;
}

/// Result of analysing every face in one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub verdict: Verdict,
    pub confidence: f64,
    pub faces_detected: usize,
    pub faces: Vec<FaceResult>,
}

/// Raw scores gathered from the sampled frames of a video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampledScores {
    pub scores: Vec<f64>,
    pub frame_numbers: Vec<u64>,
    /// Frames visited by the plan, including those without a face.
    pub frames_sampled: usize,
}

/// Crop a face with margin, resize it to the classifier input and scale
/// pixels to [0, 1].
///
/// Returns an NHWC tensor of shape `(1, 64, 64, 3)`.
pub fn preprocess_face(
    image: &RgbImage,
    bbox: &BoundingBox,
) -> Result<Array4<f32>, InferenceError> {
    let region = crop_region(bbox, image.width(), image.height(), FACE_MARGIN).ok_or_else(|| {
        InferenceError::InvalidInput(format!(
            "face box {bbox:?} lies outside the {}x{} image",
            image.width(),
            image.height()
        ))
    })?;

    let crop = imageops::crop_imm(image, region.x1, region.y1, region.width(), region.height())
        .to_image();
    let resized = imageops::resize(
        &crop,
        CLASSIFIER_INPUT_SIZE,
        CLASSIFIER_INPUT_SIZE,
        FilterType::Triangle,
    );

    let size = CLASSIFIER_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
        }
    }
    Ok(tensor)
}

/// Score every located face of an image and aggregate the verdict.
pub fn analyze_image<L, S>(
    image: &RgbImage,
    locator: &mut L,
    scorer: &mut S,
    config: &ThresholdConfig,
) -> Result<ImageAnalysis, PipelineError>
where
    L: FaceLocator + ?Sized,
    S: FaceScorer + ?Sized,
{
    let boxes = locator.locate(image)?;
    tracing::debug!(faces = boxes.len(), "located faces");

    // (locator position, box, score); skipped faces keep their number free.
    let mut scored = Vec::with_capacity(boxes.len());
    for (position, bbox) in boxes.into_iter().enumerate() {
        let input = match preprocess_face(image, &bbox) {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!(face = position + 1, error = %err, "skipping face");
                continue;
            }
        };
        let score = scorer.score(&input)?;
        validate_score(scored.len(), score)?;
        scored.push((position, bbox, score));
    }

    if scored.is_empty() {
        return Err(PipelineError::NoFaceDetected);
    }

    let scores: Vec<f64> = scored.iter().map(|(_, _, s)| *s).collect();
    let aggregate = classify_faces(&scores, config)?;

    let faces = scored
        .iter()
        .zip(&aggregate.faces)
        .map(|((position, bbox, _), face)| FaceResult {
            face_number: position + 1,
            bbox: *bbox,
            verdict: face.verdict,
            confidence: face.confidence,
            score: face.score,
        })
        .collect::<Vec<_>>();

    Ok(ImageAnalysis {
        verdict: aggregate.verdict,
        confidence: aggregate.confidence,
        faces_detected: faces.len(),
        faces,
    })
}

/// Walk decoded frames in order and score the primary face of each frame
/// selected by `plan`.
pub fn sample_video<I, L, S>(
    frames: I,
    plan: &SamplingPlan,
    locator: &mut L,
    scorer: &mut S,
) -> Result<SampledScores, PipelineError>
where
    I: IntoIterator<Item = RgbImage>,
    L: FaceLocator + ?Sized,
    S: FaceScorer + ?Sized,
{
    let mut sampled = SampledScores::default();
    let mut frames = frames.into_iter();

    for index in 0u64.. {
        // Checked before pulling so a lazy decoder stops at the limit.
        if plan.is_exhausted(sampled.scores.len(), sampled.frames_sampled) {
            break;
        }
        let Some(frame) = frames.next() else {
            break;
        };
        if !plan.is_sampled(index) {
            continue;
        }
        sampled.frames_sampled += 1;

        let Some(face) = locator.locate(&frame)?.into_iter().next() else {
            continue;
        };
        let input = match preprocess_face(&frame, &face) {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!(frame = index, error = %err, "skipping frame");
                continue;
            }
        };
        let score = scorer.score(&input)?;
        validate_score(sampled.scores.len(), score)?;
        sampled.scores.push(score);
        sampled.frame_numbers.push(index);
    }

    tracing::debug!(
        sampled = sampled.frames_sampled,
        scored = sampled.scores.len(),
        interval = plan.interval,
        "video sampling finished"
    );

    Ok(sampled)
}

/// Whole-video verdict: one frame per second, three-zone rule on the mean.
pub fn analyze_video<I, L, S>(
    frames: I,
    fps: f64,
    locator: &mut L,
    scorer: &mut S,
    config: &ThresholdConfig,
) -> Result<VideoVerdict, PipelineError>
where
    I: IntoIterator<Item = RgbImage>,
    L: FaceLocator + ?Sized,
    S: FaceScorer + ?Sized,
{
    let sampled = sample_video(frames, &SamplingPlan::whole_video(fps), locator, scorer)?;
    if sampled.scores.is_empty() {
        return Err(PipelineError::NoFaceDetected);
    }
    Ok(classify_video_sampled(&sampled.scores, config)?)
}

/// Temporal consistency: two frames per second, two-zone verdict.
pub fn analyze_temporal<I, L, S>(
    frames: I,
    fps: f64,
    locator: &mut L,
    scorer: &mut S,
    config: &ThresholdConfig,
) -> Result<TemporalResult, PipelineError>
where
    I: IntoIterator<Item = RgbImage>,
    L: FaceLocator + ?Sized,
    S: FaceScorer + ?Sized,
{
    let sampled = sample_video(frames, &SamplingPlan::temporal(fps), locator, scorer)?;
    if sampled.scores.is_empty() {
        return Err(PipelineError::NoFaceDetected);
    }
    Ok(classify_temporal(&sampled.scores, &sampled.frame_numbers, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Returns the same boxes for every image.
    struct FixedLocator(Vec<BoundingBox>);

    impl FaceLocator for FixedLocator {
        fn locate(&mut self, _image: &RgbImage) -> Result<Vec<BoundingBox>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    /// Finds one face only in frames whose top-left pixel is non-zero.
    struct LitFrameLocator;

    impl FaceLocator for LitFrameLocator {
        fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, InferenceError> {
            if image.get_pixel(0, 0)[0] == 0 {
                Ok(vec![])
            } else {
                Ok(vec![make_bbox(0, 0, 8, 8)])
            }
        }
    }

    /// Scores a crop by its mean intensity.
    struct BrightnessScorer {
        calls: usize,
    }

    impl FaceScorer for BrightnessScorer {
        fn score(&mut self, face: &Array4<f32>) -> Result<f64, InferenceError> {
            self.calls += 1;
            Ok(face.mean().unwrap_or(0.0) as f64)
        }
    }

    struct QueueScorer(Vec<f64>);

    impl FaceScorer for QueueScorer {
        fn score(&mut self, _face: &Array4<f32>) -> Result<f64, InferenceError> {
            if self.0.is_empty() {
                return Err(InferenceError::Scorer("queue drained".into()));
            }
            Ok(self.0.remove(0))
        }
    }

    fn make_bbox(x: i32, y: i32, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width,
            height,
            confidence: 0.95,
        }
    }

    fn uniform(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn test_preprocess_shape_and_scale() {
        let image = uniform(100, 80, 255);
        let tensor = preprocess_face(&image, &make_bbox(30, 20, 20, 20)).unwrap();
        assert_eq!(tensor.shape(), &[1, 64, 64, 3]);
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_preprocess_rejects_box_outside_image() {
        let image = uniform(32, 32, 10);
        let err = preprocess_face(&image, &make_bbox(500, 500, 10, 10)).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }

    #[test]
    fn test_analyze_image_numbers_faces() {
        let image = uniform(200, 200, 128);
        let mut locator = FixedLocator(vec![
            make_bbox(10, 10, 40, 40),
            make_bbox(100, 10, 40, 40),
            make_bbox(10, 100, 40, 40),
        ]);
        let mut scorer = QueueScorer(vec![0.1, 0.1, 0.9]);

        let result =
            analyze_image(&image, &mut locator, &mut scorer, &ThresholdConfig::default()).unwrap();

        assert_eq!(result.verdict, Verdict::Fake);
        assert_eq!(result.faces_detected, 3);
        let numbers: Vec<usize> = result.faces.iter().map(|f| f.face_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(result.faces[2].verdict, Verdict::Real);
        assert_eq!(result.faces[1].bbox.x, 100);
    }

    #[test]
    fn test_analyze_image_keeps_locator_numbering_past_skipped_face() {
        let image = uniform(32, 32, 128);
        let mut locator = FixedLocator(vec![make_bbox(900, 900, 10, 10), make_bbox(1, 1, 10, 10)]);
        let mut scorer = QueueScorer(vec![0.9]);

        let result =
            analyze_image(&image, &mut locator, &mut scorer, &ThresholdConfig::default()).unwrap();

        assert_eq!(result.faces_detected, 1);
        assert_eq!(result.faces[0].face_number, 2);
        assert_eq!(result.faces[0].bbox.x, 1);
    }

    #[test]
    fn test_analyze_image_without_faces() {
        let image = uniform(64, 64, 128);
        let mut scorer = BrightnessScorer { calls: 0 };
        let err = analyze_image(
            &image,
            &mut FixedLocator(vec![]),
            &mut scorer,
            &ThresholdConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::NoFaceDetected));
        assert_eq!(scorer.calls, 0);
    }

    #[test]
    fn test_analyze_image_rejects_out_of_range_score() {
        let image = uniform(64, 64, 128);
        let err = analyze_image(
            &image,
            &mut FixedLocator(vec![make_bbox(0, 0, 10, 10)]),
            &mut QueueScorer(vec![1.5]),
            &ThresholdConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Score(ScoreError::InvalidScore { .. })));
    }

    #[test]
    fn test_scorer_errors_propagate() {
        let image = uniform(64, 64, 128);
        let err = analyze_image(
            &image,
            &mut FixedLocator(vec![make_bbox(0, 0, 10, 10)]),
            &mut QueueScorer(vec![]),
            &ThresholdConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Inference(InferenceError::Scorer(_))));
    }

    #[test]
    fn test_whole_video_limits_sampled_frames() {
        // 4 fps, 60 frames: sampled at 0, 4, 8, ... and stops after 10 visits.
        let frames: Vec<RgbImage> = (0..60).map(|_| uniform(16, 16, 255)).collect();
        let mut scorer = BrightnessScorer { calls: 0 };
        let sampled = sample_video(
            frames,
            &SamplingPlan::whole_video(4.0),
            &mut LitFrameLocator,
            &mut scorer,
        )
        .unwrap();

        assert_eq!(sampled.frames_sampled, 10);
        assert_eq!(sampled.scores.len(), 10);
        assert_eq!(sampled.frame_numbers[..3], [0, 4, 8]);
        assert_eq!(scorer.calls, 10);
    }

    #[test]
    fn test_sampling_stops_pulling_frames_at_limit() {
        let pulled = std::cell::Cell::new(0usize);
        let frames = (0..100).map(|_| {
            pulled.set(pulled.get() + 1);
            uniform(16, 16, 255)
        });
        let sampled = sample_video(
            frames,
            &SamplingPlan::whole_video(1.0),
            &mut LitFrameLocator,
            &mut BrightnessScorer { calls: 0 },
        )
        .unwrap();

        assert_eq!(sampled.frames_sampled, 10);
        assert_eq!(pulled.get(), 10);
    }

    #[test]
    fn test_sampling_fails_on_first_invalid_score() {
        let frames: Vec<RgbImage> = (0..20).map(|_| uniform(16, 16, 255)).collect();
        let mut scorer = QueueScorer(vec![0.4, f64::NAN, 0.6, 0.7]);
        let err = sample_video(
            frames,
            &SamplingPlan::whole_video(1.0),
            &mut LitFrameLocator,
            &mut scorer,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Score(ScoreError::InvalidScore { index: 1, .. })
        ));
        assert_eq!(scorer.0, vec![0.6, 0.7]);
    }

    #[test]
    fn test_whole_video_counts_faceless_frames() {
        // Every other sampled frame is dark and has no face.
        let frames: Vec<RgbImage> = (0..40)
            .map(|i| uniform(16, 16, if (i / 2) % 2 == 0 { 200 } else { 0 }))
            .collect();
        let sampled = sample_video(
            frames,
            &SamplingPlan::whole_video(2.0),
            &mut LitFrameLocator,
            &mut BrightnessScorer { calls: 0 },
        )
        .unwrap();

        assert_eq!(sampled.frames_sampled, 10);
        assert_eq!(sampled.scores.len(), 5);
        assert_eq!(sampled.frame_numbers[..2], [0, 4]);
    }

    #[test]
    fn test_temporal_limits_scored_frames() {
        let frames: Vec<RgbImage> = (0..100).map(|_| uniform(16, 16, 255)).collect();
        let sampled = sample_video(
            frames,
            &SamplingPlan::temporal(2.0),
            &mut LitFrameLocator,
            &mut BrightnessScorer { calls: 0 },
        )
        .unwrap();
        assert_eq!(sampled.scores.len(), 30);
        assert_eq!(sampled.frame_numbers[29], 29);
    }

    #[test]
    fn test_analyze_video_verdict() {
        let frames: Vec<RgbImage> = (0..30).map(|_| uniform(16, 16, 255)).collect();
        let result = analyze_video(
            frames,
            10.0,
            &mut LitFrameLocator,
            &mut BrightnessScorer { calls: 0 },
            &ThresholdConfig::default(),
        )
        .unwrap();
        assert_eq!(result.verdict, Verdict::Real);
        assert_eq!(result.frames_analyzed, 3);
        assert_eq!(result.zone_counts.real_frames, 3);
    }

    #[test]
    fn test_analyze_temporal_without_faces() {
        let frames: Vec<RgbImage> = (0..10).map(|_| uniform(16, 16, 0)).collect();
        let err = analyze_temporal(
            frames,
            2.0,
            &mut LitFrameLocator,
            &mut BrightnessScorer { calls: 0 },
            &ThresholdConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::NoFaceDetected));
    }

    #[test]
    fn test_analyze_temporal_records_jumps() {
        // Alternating bright and dim lit frames, every frame sampled at 1 fps.
        let frames: Vec<RgbImage> = (0..4)
            .map(|i| uniform(16, 16, if i % 2 == 0 { 255 } else { 26 }))
            .collect();
        let result = analyze_temporal(
            frames,
            1.0,
            &mut LitFrameLocator,
            &mut BrightnessScorer { calls: 0 },
            &ThresholdConfig::default(),
        )
        .unwrap();
        assert_eq!(result.frames_analyzed, 4);
        let frames: Vec<u64> = result.jumps.iter().map(|j| j.frame).collect();
        assert_eq!(frames, vec![1, 2, 3]);
    }
}
