//! Recorded model outputs for one image, replayed through the engine.
//!
//! A scene file holds what the two models produced for an image: the head
//! detections and every pose in image coordinates. [`RecordedPoses`] serves
//! those poses back per search region, the way a live pose model would.
//!
//! ```yaml
//! image: { width: 1000, height: 800 }
//! detections:
//!   - { bbox: [480, 500, 520, 550], confidence: 0.9, class_id: 0 }
//! poses:
//!   - keypoints: [[500, 525, 0.9], ...]   # 17 COCO keypoints (x, y, confidence)
//! ```

use crate::detection::RawDetection;
use crate::geometry::{BoundingBox, FrameSize};
use crate::keypoints::{Keypoint, KeypointSet};
use crate::pipeline::{PoseRequest, PoseSource};
use crate::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image dimensions in a scene file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// One head model output row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneDetection {
    /// `[x1, y1, x2, y2]` in pixels
    pub bbox: [f32; 4],
    pub confidence: f32,
    #[serde(default)]
    pub class_id: u32,
}

/// One person's keypoints in image coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePose {
    /// `[x, y, confidence]` per COCO keypoint
    pub keypoints: Vec<[f32; 3]>,
}

/// Recorded detections and poses of one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub image: ImageSize,
    #[serde(default)]
    pub detections: Vec<SceneDetection>,
    #[serde(default)]
    pub poses: Vec<ScenePose>,
}

impl Scene {
    /// Load a scene from a YAML (or JSON) file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scene from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scene
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Image size
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero
    pub fn frame(&self) -> Result<FrameSize> {
        FrameSize::new(self.image.width, self.image.height)
    }

    /// Head model output as engine detections
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid box
    pub fn raw_detections(&self) -> Result<Vec<RawDetection>> {
        self.detections
            .iter()
            .map(|det| {
                let [x1, y1, x2, y2] = det.bbox;
                Ok(RawDetection {
                    bbox: BoundingBox::new(x1, y1, x2, y2)?,
                    confidence: det.confidence,
                    class_id: det.class_id,
                })
            })
            .collect()
    }

    /// Recorded poses as keypoint sets
    ///
    /// # Errors
    ///
    /// Returns an error if a pose does not hold 17 keypoints
    pub fn keypoint_sets(&self) -> Result<Vec<KeypointSet>> {
        self.poses
            .iter()
            .map(|pose| {
                let keypoints: Vec<Keypoint> = pose
                    .keypoints
                    .iter()
                    .map(|[x, y, c]| Keypoint::new(*x, *y, *c))
                    .collect();
                KeypointSet::from_slice(&keypoints)
            })
            .collect()
    }

    /// Pose source replaying this scene's poses
    ///
    /// # Errors
    ///
    /// Returns an error if a pose is malformed
    pub fn recorded_poses(&self) -> Result<RecordedPoses> {
        Ok(RecordedPoses::new(self.keypoint_sets()?))
    }
}

/// Pose source backed by poses recorded in image coordinates.
///
/// A request returns the poses whose nose lies in the region, shifted into
/// region-local coordinates.
#[derive(Debug, Clone, Default)]
pub struct RecordedPoses {
    sets: Vec<KeypointSet>,
}

impl RecordedPoses {
    #[must_use]
    pub const fn new(sets: Vec<KeypointSet>) -> Self {
        Self { sets }
    }
}

impl PoseSource for RecordedPoses {
    fn estimate(&mut self, request: &PoseRequest) -> Result<Vec<KeypointSet>> {
        let (dx, dy) = request.region.offset();
        let local: Vec<KeypointSet> = self
            .sets
            .iter()
            .filter(|set| request.region.contains(&set.nose().point()))
            .map(|set| set.translated((-dx, -dy)))
            .collect();

        debug!("{} recorded poses in region {:?}", local.len(), request.region);
        Ok(local)
    }

    fn name(&self) -> &str {
        "recorded"
    }
}
