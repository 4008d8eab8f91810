//! Media-kind detection, video frame sampling and face crop geometry.

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixels added on every side of a located face before cropping.
pub const FACE_MARGIN: u32 = 20;

/// Scored frames kept by a temporal analysis.
pub const TEMPORAL_MAX_SCORED_FRAMES: usize = 30;

/// Frames visited (scored or not) by a whole-video analysis.
pub const WHOLE_VIDEO_MAX_SAMPLED_FRAMES: usize = 10;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "avif"];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "mkv", "flv", "wmv", "mpg", "mpeg", "m4v", "3gp", "webm", "ogv",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a file by extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// What the frame limit of a [`SamplingPlan`] counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingLimit {
    /// Stop once this many frames produced a score.
    ScoredFrames(usize),
    /// Stop once this many frames were sampled, with or without a face.
    SampledFrames(usize),
}

/// Which frames of a video to run through the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    pub interval: u64,
    pub limit: SamplingLimit,
}

impl SamplingPlan {
    /// Two frames per second, up to [`TEMPORAL_MAX_SCORED_FRAMES`] scores.
    pub fn temporal(fps: f64) -> Self {
        Self {
            interval: frame_interval(fps / 2.0),
            limit: SamplingLimit::ScoredFrames(TEMPORAL_MAX_SCORED_FRAMES),
        }
    }

    /// One frame per second, up to [`WHOLE_VIDEO_MAX_SAMPLED_FRAMES`] visits.
    pub fn whole_video(fps: f64) -> Self {
        Self {
            interval: frame_interval(fps),
            limit: SamplingLimit::SampledFrames(WHOLE_VIDEO_MAX_SAMPLED_FRAMES),
        }
    }

    pub fn is_sampled(&self, frame_index: u64) -> bool {
        frame_index % self.interval == 0
    }

    /// True once `scored` / `sampled` frame counts have reached the limit.
    pub fn is_exhausted(&self, scored: usize, sampled: usize) -> bool {
        match self.limit {
            SamplingLimit::ScoredFrames(max) => scored >= max,
            SamplingLimit::SampledFrames(max) => sampled >= max,
        }
    }
}

/// Truncate a frame count to a whole interval of at least one frame.
/// Unknown or nonsensical frame rates fall back to sampling every frame.
fn frame_interval(frames: f64) -> u64 {
    if frames.is_finite() && frames >= 1.0 {
        frames as u64
    } else {
        1
    }
}

/// Crop rectangle in image pixels, as `(x1, y1, x2, y2)` with exclusive
/// right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropRegion {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// Grow a face box by `margin` on every side and clamp it to the image.
///
/// The box origin is clamped to zero first, as locators may report
/// slightly negative coordinates. Returns `None` when nothing of the face
/// lies inside the image.
pub fn crop_region(
    bbox: &BoundingBox,
    image_width: u32,
    image_height: u32,
    margin: u32,
) -> Option<CropRegion> {
    let x = bbox.x.max(0) as i64;
    let y = bbox.y.max(0) as i64;
    let margin = margin as i64;

    let x1 = (x - margin).max(0);
    let y1 = (y - margin).max(0);
    let x2 = (x + bbox.width as i64 + margin).min(image_width as i64);
    let y2 = (y + bbox.height as i64 + margin).min(image_height as i64);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(CropRegion {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}
