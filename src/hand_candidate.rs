//! Raised-hand candidates: per-arm geometric and confidence validation.
//!
//! For each head, the pose sets whose nose falls inside the head box are
//! attributed to that head. Each arm of such a set is checked independently:
//!
//! 1. the wrist must sit above the shoulder by a margin,
//! 2. the wrist and elbow must be vertically apart (collapsed keypoints are noise),
//! 3. the forearm must point roughly upwards, with a tolerance that grows with
//!    head size,
//! 4. joint confidences must clear per-joint thresholds, or be rescued by a
//!    strong pair unless the three-joint total is too low.
//!
//! All pixel tolerances scale with the head height, which stands in for the
//! distance to the camera.

use crate::config::{DedupConfig, HandConfig};
use crate::constants::{
    ANGLE_REFERENCE_HEIGHT, DEDUP_REFERENCE_HEIGHT, MAX_ANGLE_DEG, MIN_ANGLE_DEG, MIN_WRIST_ELBOW_PX,
};
use crate::detection::HeadDetection;
use crate::geometry::{angle_between, CropRegion, FrameSize, Point};
use crate::keypoints::{Arm, KeypointSet, Side};
use crate::utils::crop_around_head;
use log::debug;

/// Straight up in image coordinates
const UP: (f32, f32) = (0.0, -1.0);

/// Why an arm was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Every joint cleared its own threshold
    Strict,
    /// Saved by a strong pair of joints
    Rescued,
}

/// Why an arm was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Wrist not above the shoulder
    Position,
    /// Wrist and elbow vertically too close
    Length,
    /// Forearm too far from vertical
    Angle,
    /// Confidences too weak, no rescue
    Confidence,
}

/// Outcome of checking one arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmCheck {
    Accepted(Acceptance),
    Rejected(RejectReason),
}

/// Pixel tolerances derived from one head's height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadScale {
    /// Head height in pixels
    pub head_height: f32,
    /// Wrist merge radius for deduplication
    pub dedup_distance: f32,
    /// Maximum forearm deviation from vertical (degrees)
    pub angle_threshold_deg: f32,
    /// Minimum vertical wrist/elbow span
    pub min_wrist_elbow: f32,
}

impl HeadScale {
    #[must_use]
    pub fn for_height(head_height: f32, hands: &HandConfig, dedup: &DedupConfig) -> Self {
        let dedup_distance = (dedup.base_dedup_distance * (head_height / DEDUP_REFERENCE_HEIGHT))
            .trunc()
            .max(dedup.min_dedup_distance);
        let angle_threshold_deg =
            (hands.base_angle_deg * (head_height / ANGLE_REFERENCE_HEIGHT)).clamp(MIN_ANGLE_DEG, MAX_ANGLE_DEG);
        let min_wrist_elbow = (head_height * hands.min_wrist_elbow_ratio).max(MIN_WRIST_ELBOW_PX);

        Self {
            head_height,
            dedup_distance,
            angle_threshold_deg,
            min_wrist_elbow,
        }
    }
}

/// A provisionally valid raised hand, awaiting deduplication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandCandidate {
    pub wrist: Point,
    pub elbow: Point,
    pub shoulder: Point,
    pub nose: Point,
    /// Wrist confidence; the ranking key for deduplication
    pub confidence: f32,
    pub side: Side,
    /// Id of the head this hand is attributed to
    pub head_id: usize,
    /// Wrist merge radius inherited from the owning head
    pub dedup_distance: f32,
    pub source_head_height: f32,
    pub acceptance: Acceptance,
}

/// Turns head boxes and pose sets into hand candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct HandCandidateBuilder {
    hands: HandConfig,
    dedup: DedupConfig,
}

impl HandCandidateBuilder {
    #[must_use]
    pub const fn new(hands: HandConfig, dedup: DedupConfig) -> Self {
        Self { hands, dedup }
    }

    /// Derived tolerances for a head
    #[must_use]
    pub fn scale_for(&self, head: &HeadDetection) -> HeadScale {
        HeadScale::for_height(head.height, &self.hands, &self.dedup)
    }

    /// Region of the image to hand to the pose model for this head
    #[must_use]
    pub fn search_region(&self, head: &HeadDetection, frame: FrameSize) -> Option<CropRegion> {
        crop_around_head(
            &head.bbox,
            frame,
            self.hands.head_height_multiplier,
            self.hands.crop_vertical_shift,
            self.hands.min_crop_width,
        )
    }

    /// Validate one arm
    #[must_use]
    pub fn check_arm(&self, arm: &Arm, scale: &HeadScale) -> ArmCheck {
        let cfg = &self.hands;
        let (wrist, elbow, shoulder) = (&arm.wrist, &arm.elbow, &arm.shoulder);

        if wrist.y > shoulder.y - cfg.raise_margin {
            return ArmCheck::Rejected(RejectReason::Position);
        }
        if (wrist.y - elbow.y).abs() < scale.min_wrist_elbow {
            return ArmCheck::Rejected(RejectReason::Length);
        }

        let forearm = elbow.point().vector_to(&wrist.point());
        if angle_between(forearm, UP) > scale.angle_threshold_deg {
            return ArmCheck::Rejected(RejectReason::Angle);
        }

        let (wc, ec, sc) = (wrist.confidence, elbow.confidence, shoulder.confidence);
        if wc >= cfg.wrist_conf_threshold && ec >= cfg.elbow_conf_threshold && sc >= cfg.shoulder_conf_threshold {
            return ArmCheck::Accepted(Acceptance::Strict);
        }

        let pair_rescue = wc + ec >= cfg.pair_wrist_elbow_threshold
            || wc + sc >= cfg.pair_wrist_shoulder_threshold
            || ec + sc >= cfg.pair_elbow_shoulder_threshold;
        // A strong pair cannot carry a near-zero third joint
        let rescued = pair_rescue && wc + ec + sc >= cfg.total_conf_threshold;

        if rescued {
            ArmCheck::Accepted(Acceptance::Rescued)
        } else {
            ArmCheck::Rejected(RejectReason::Confidence)
        }
    }

    /// Build the hand candidates of one head.
    ///
    /// Keypoint sets must already be in image coordinates. Sets whose nose is
    /// outside the head box belong to someone else and are ignored.
    #[must_use]
    pub fn build(&self, head: &HeadDetection, keypoint_sets: &[KeypointSet]) -> Vec<HandCandidate> {
        let scale = self.scale_for(head);
        let mut candidates = Vec::new();

        for set in keypoint_sets {
            let nose = set.nose().point();
            if !head.bbox.contains(&nose) {
                continue;
            }

            for side in Side::ALL {
                let arm = set.arm(side);
                match self.check_arm(&arm, &scale) {
                    ArmCheck::Accepted(acceptance) => candidates.push(HandCandidate {
                        wrist: arm.wrist.point(),
                        elbow: arm.elbow.point(),
                        shoulder: arm.shoulder.point(),
                        nose,
                        confidence: arm.wrist.confidence,
                        side,
                        head_id: head.id,
                        dedup_distance: scale.dedup_distance,
                        source_head_height: scale.head_height,
                        acceptance,
                    }),
                    ArmCheck::Rejected(reason) => {
                        debug!("Head {} {:?} arm rejected: {:?}", head.id, side, reason);
                    }
                }
            }
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::keypoints::{Keypoint, KeypointIndex};

    fn builder() -> HandCandidateBuilder {
        HandCandidateBuilder::default()
    }

    fn scale(height: f32) -> HeadScale {
        HeadScale::for_height(height, &HandConfig::default(), &DedupConfig::default())
    }

    fn arm(wrist: (f32, f32, f32), elbow: (f32, f32, f32), shoulder: (f32, f32, f32)) -> Arm {
        Arm {
            wrist: Keypoint::new(wrist.0, wrist.1, wrist.2),
            elbow: Keypoint::new(elbow.0, elbow.1, elbow.2),
            shoulder: Keypoint::new(shoulder.0, shoulder.1, shoulder.2),
        }
    }

    #[test]
    fn test_head_scale_values() {
        let s = scale(100.0);
        assert_eq!(s.dedup_distance, 55.0);
        assert_eq!(s.angle_threshold_deg, 50.0);
        assert_eq!(s.min_wrist_elbow, 70.0);

        let s = scale(20.0);
        assert_eq!(s.dedup_distance, 20.0);
        assert_eq!(s.min_wrist_elbow, 14.0);

        let s = scale(5.0);
        assert_eq!(s.min_wrist_elbow, 5.0);

        let s = scale(300.0);
        assert_eq!(s.angle_threshold_deg, 90.0);
        assert_eq!(s.dedup_distance, 165.0);

        // 55 * 0.43 = 23.65 truncates to 23
        assert_eq!(scale(43.0).dedup_distance, 23.0);
    }

    #[test]
    fn test_rejects_wrist_below_raise_margin() {
        let s = scale(50.0);
        let check = builder().check_arm(&arm((100.0, 195.0, 0.9), (100.0, 250.0, 0.9), (100.0, 200.0, 0.9)), &s);
        assert_eq!(check, ArmCheck::Rejected(RejectReason::Position));

        let level = builder().check_arm(&arm((100.0, 200.0, 0.9), (100.0, 140.0, 0.9), (100.0, 200.0, 0.9)), &s);
        assert_eq!(level, ArmCheck::Rejected(RejectReason::Position));
    }

    #[test]
    fn test_rejects_collapsed_forearm() {
        // min span for h=50 is 35 px
        let s = scale(50.0);
        let check = builder().check_arm(&arm((100.0, 100.0, 0.9), (100.0, 130.0, 0.9), (100.0, 200.0, 0.9)), &s);
        assert_eq!(check, ArmCheck::Rejected(RejectReason::Length));
    }

    #[test]
    fn test_rejects_slanted_forearm() {
        // 60 degrees off vertical, tolerance for h=50 is 50 degrees
        let s = scale(50.0);
        let dy = 40.0;
        let dx = dy * 60f32.to_radians().tan();
        let check =
            builder().check_arm(&arm((100.0 + dx, 100.0, 0.9), (100.0, 100.0 + dy, 0.9), (100.0, 200.0, 0.9)), &s);
        assert_eq!(check, ArmCheck::Rejected(RejectReason::Angle));
    }

    #[test]
    fn test_strict_acceptance() {
        let s = scale(50.0);
        let check = builder().check_arm(&arm((100.0, 60.0, 0.6), (100.0, 120.0, 0.5), (100.0, 200.0, 0.3)), &s);
        assert_eq!(check, ArmCheck::Accepted(Acceptance::Strict));
    }

    #[test]
    fn test_pair_rescue() {
        let s = scale(50.0);
        // wrist weak, elbow + shoulder strong
        let check = builder().check_arm(&arm((100.0, 60.0, 0.1), (100.0, 120.0, 0.96), (100.0, 200.0, 0.96)), &s);
        assert_eq!(check, ArmCheck::Accepted(Acceptance::Rescued));
    }

    #[test]
    fn test_weak_joints_fail() {
        let s = scale(50.0);
        let check = builder().check_arm(&arm((100.0, 60.0, 0.4), (100.0, 120.0, 0.4), (100.0, 200.0, 0.4)), &s);
        assert_eq!(check, ArmCheck::Rejected(RejectReason::Confidence));
    }

    #[test]
    fn test_total_floor_revokes_rescue() {
        let hands = HandConfig {
            pair_wrist_elbow_threshold: 1.0,
            total_conf_threshold: 1.7,
            ..HandConfig::default()
        };
        let builder = HandCandidateBuilder::new(hands, DedupConfig::default());
        let s = scale(50.0);

        // Pair 0.55 + 0.55 clears the relaxed pair threshold, but the total 1.1 does not
        let check = builder.check_arm(&arm((100.0, 60.0, 0.55), (100.0, 120.0, 0.55), (100.0, 200.0, 0.0)), &s);
        assert_eq!(check, ArmCheck::Rejected(RejectReason::Confidence));
    }

    #[test]
    fn test_build_ignores_other_peoples_poses() {
        let head = HeadDetection::new(3, BoundingBox::new(80.0, 150.0, 120.0, 200.0).unwrap());
        let mut set = KeypointSet::default();
        set.set(KeypointIndex::Nose, Keypoint::new(300.0, 170.0, 0.9));
        set.set(KeypointIndex::LeftShoulder, Keypoint::new(320.0, 230.0, 0.9));
        set.set(KeypointIndex::LeftElbow, Keypoint::new(320.0, 170.0, 0.9));
        set.set(KeypointIndex::LeftWrist, Keypoint::new(320.0, 100.0, 0.9));

        assert!(builder().build(&head, &[set]).is_empty());
    }

    #[test]
    fn test_build_carries_head_scale() {
        let head = HeadDetection::new(3, BoundingBox::new(80.0, 150.0, 120.0, 200.0).unwrap());
        let mut set = KeypointSet::default();
        set.set(KeypointIndex::Nose, Keypoint::new(100.0, 175.0, 0.9));
        set.set(KeypointIndex::RightShoulder, Keypoint::new(80.0, 230.0, 0.9));
        set.set(KeypointIndex::RightElbow, Keypoint::new(80.0, 170.0, 0.9));
        set.set(KeypointIndex::RightWrist, Keypoint::new(80.0, 100.0, 0.7));

        let candidates = builder().build(&head, &[set]);
        assert_eq!(candidates.len(), 1);
        let hand = &candidates[0];
        assert_eq!(hand.side, Side::Right);
        assert_eq!(hand.head_id, 3);
        assert_eq!(hand.confidence, 0.7);
        assert_eq!(hand.dedup_distance, 27.0);
        assert_eq!(hand.source_head_height, 50.0);
        assert_eq!(hand.nose, Point::new(100.0, 175.0));
        assert_eq!(hand.acceptance, Acceptance::Strict);
    }

    #[test]
    fn test_build_without_keypoints_is_empty() {
        let head = HeadDetection::new(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap());
        assert!(builder().build(&head, &[]).is_empty());
    }
}
