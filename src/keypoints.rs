//! COCO pose keypoints as produced by the external pose model.

use crate::constants::{KEYPOINT_VALUES, NUM_POSE_KEYPOINTS};
use crate::geometry::Point;
use crate::utils::truncate_px;
use crate::{Error, Result};
use ndarray::ArrayView3;

/// Body side of an arm, from the subject's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Subject's left arm
    Left,
    /// Subject's right arm
    Right,
}

impl Side {
    /// Both sides, left first
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];
}

/// The 17 COCO keypoint indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = NUM_POSE_KEYPOINTS;

    /// Shoulder landmark for a side
    #[must_use]
    pub const fn shoulder(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftShoulder,
            Side::Right => Self::RightShoulder,
        }
    }

    /// Elbow landmark for a side
    #[must_use]
    pub const fn elbow(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftElbow,
            Side::Right => Self::RightElbow,
        }
    }

    /// Wrist landmark for a side
    #[must_use]
    pub const fn wrist(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftWrist,
            Side::Right => Self::RightWrist,
        }
    }

    /// Landmark at the mirrored position (left <-> right), nose unchanged
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Nose => Self::Nose,
            Self::LeftEye => Self::RightEye,
            Self::RightEye => Self::LeftEye,
            Self::LeftEar => Self::RightEar,
            Self::RightEar => Self::LeftEar,
            Self::LeftShoulder => Self::RightShoulder,
            Self::RightShoulder => Self::LeftShoulder,
            Self::LeftElbow => Self::RightElbow,
            Self::RightElbow => Self::LeftElbow,
            Self::LeftWrist => Self::RightWrist,
            Self::RightWrist => Self::LeftWrist,
            Self::LeftHip => Self::RightHip,
            Self::RightHip => Self::LeftHip,
            Self::LeftKnee => Self::RightKnee,
            Self::RightKnee => Self::LeftKnee,
            Self::LeftAnkle => Self::RightAnkle,
            Self::RightAnkle => Self::LeftAnkle,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEye),
            2 => Some(Self::RightEye),
            3 => Some(Self::LeftEar),
            4 => Some(Self::RightEar),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::RightShoulder),
            7 => Some(Self::LeftElbow),
            8 => Some(Self::RightElbow),
            9 => Some(Self::LeftWrist),
            10 => Some(Self::RightWrist),
            11 => Some(Self::LeftHip),
            12 => Some(Self::RightHip),
            13 => Some(Self::LeftKnee),
            14 => Some(Self::RightKnee),
            15 => Some(Self::LeftAnkle),
            16 => Some(Self::RightAnkle),
            _ => None,
        }
    }
}

/// A single landmark in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Model confidence (0.0-1.0)
    pub confidence: f32,
}

impl Keypoint {
    #[must_use]
    pub const fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Shoulder, elbow and wrist of one side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arm {
    pub shoulder: Keypoint,
    pub elbow: Keypoint,
    pub wrist: Keypoint,
}

/// One person's pose: 17 landmarks indexed by [`KeypointIndex`]
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSet {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl KeypointSet {
    #[must_use]
    pub const fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// Build a set from a slice of exactly 17 keypoints
    ///
    /// # Errors
    ///
    /// Returns an error if the slice does not hold 17 keypoints
    pub fn from_slice(keypoints: &[Keypoint]) -> Result<Self> {
        let keypoints: [Keypoint; KeypointIndex::COUNT] = keypoints.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "Expected {} keypoints, got {}",
                KeypointIndex::COUNT,
                keypoints.len()
            ))
        })?;
        Ok(Self::new(keypoints))
    }

    #[must_use]
    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    pub fn set(&mut self, index: KeypointIndex, keypoint: Keypoint) {
        self.keypoints[index as usize] = keypoint;
    }

    #[must_use]
    pub fn nose(&self) -> &Keypoint {
        self.get(KeypointIndex::Nose)
    }

    #[must_use]
    pub fn arm(&self, side: Side) -> Arm {
        Arm {
            shoulder: *self.get(KeypointIndex::shoulder(side)),
            elbow: *self.get(KeypointIndex::elbow(side)),
            wrist: *self.get(KeypointIndex::wrist(side)),
        }
    }

    /// Move region-local keypoints into the image frame.
    ///
    /// Local coordinates are truncated to whole pixels before the region
    /// offset is added; confidences are kept.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn translated(&self, offset: (i32, i32)) -> Self {
        let mut keypoints = self.keypoints;
        for kp in &mut keypoints {
            kp.x = (truncate_px(kp.x) + offset.0) as f32;
            kp.y = (truncate_px(kp.y) + offset.1) as f32;
        }
        Self::new(keypoints)
    }
}

impl Default for KeypointSet {
    fn default() -> Self {
        Self {
            keypoints: [Keypoint::default(); KeypointIndex::COUNT],
        }
    }
}

/// Decode raw pose model output of shape `[N, 17, 3]` (x, y, confidence).
///
/// # Errors
///
/// Returns an error if the tensor does not have 17 keypoints of at least 3 values
pub fn decode_pose_output(output: ArrayView3<f32>) -> Result<Vec<KeypointSet>> {
    let (_, n_keypoints, n_values) = output.dim();
    if n_keypoints != KeypointIndex::COUNT || n_values < KEYPOINT_VALUES {
        return Err(Error::InvalidInput(format!(
            "Pose output must have shape [N, {}, {}], got {:?}",
            KeypointIndex::COUNT,
            KEYPOINT_VALUES,
            output.shape()
        )));
    }

    let sets = output
        .outer_iter()
        .map(|person| {
            let mut set = KeypointSet::default();
            for (i, row) in person.outer_iter().enumerate() {
                set.keypoints[i] = Keypoint::new(row[0], row[1], row[2]);
            }
            set
        })
        .collect();

    Ok(sets)
}
