//! End-to-end hand-raise detection for one image.
//!
//! Head boxes come from the external head model. For every head a search
//! region is cut around it and handed to a [`PoseSource`]; the returned
//! keypoints are moved back into image coordinates, turned into candidates,
//! deduplicated across the whole image and reduced to one vote per head.

use crate::config::Config;
use crate::dedup::HandDeduplicator;
use crate::detection::{select_heads, HeadDetection, RawDetection};
use crate::geometry::{CropRegion, FrameSize};
use crate::hand_candidate::{HandCandidate, HandCandidateBuilder};
use crate::keypoints::KeypointSet;
use crate::survey::SurveyResult;
use crate::vote::{HeadVote, VoteAggregator, VoteTally};
use crate::Result;
use log::{debug, info, warn};

/// One query to the pose model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRequest {
    /// Image region to run the model on
    pub region: CropRegion,
    /// Keypoint confidence floor for the model
    pub min_confidence: f32,
    /// Inference resolution
    pub input_size: u32,
}

/// Trait for pose keypoint providers
pub trait PoseSource {
    /// Estimate the poses visible in a region.
    ///
    /// Keypoints are returned in region-local pixel coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails on this region
    fn estimate(&mut self, request: &PoseRequest) -> Result<Vec<KeypointSet>>;

    /// Get source name
    fn name(&self) -> &str;
}

/// A head together with the poses found in its search region (image frame)
#[derive(Debug, Clone, PartialEq)]
pub struct HeadPoses {
    pub head: HeadDetection,
    pub keypoint_sets: Vec<KeypointSet>,
}

/// Hand-raise detector for single images
#[derive(Debug, Clone)]
pub struct HandRaiseDetector {
    config: Config,
    builder: HandCandidateBuilder,
    deduplicator: HandDeduplicator,
    aggregator: VoteAggregator,
}

impl HandRaiseDetector {
    /// Create a detector from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            builder: HandCandidateBuilder::new(config.hands, config.dedup),
            deduplicator: HandDeduplicator::new(config.dedup),
            aggregator: VoteAggregator::new(config.vote.both_sides),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Heads of the configured class above the vote-mode confidence threshold
    #[must_use]
    pub fn heads(&self, detections: &[RawDetection]) -> Vec<HeadDetection> {
        select_heads(
            detections,
            self.config.vote.head_class_id,
            self.config.vote.head_confidence_threshold,
        )
    }

    /// Pose query for a head, or `None` when its search region collapses
    #[must_use]
    pub fn pose_request(&self, head: &HeadDetection, frame: FrameSize) -> Option<PoseRequest> {
        self.builder.search_region(head, frame).map(|region| PoseRequest {
            region,
            min_confidence: self.config.hands.pose_model_confidence,
            input_size: self.config.hands.pose_input_size,
        })
    }

    /// Classify heads whose poses are already known.
    ///
    /// Every head gets a vote, in input order, even without poses.
    #[must_use]
    pub fn classify(&self, heads: &[HeadPoses]) -> Vec<HeadVote> {
        let candidates: Vec<HandCandidate> = heads
            .iter()
            .flat_map(|h| self.builder.build(&h.head, &h.keypoint_sets))
            .collect();
        let candidate_count = candidates.len();

        let accepted = self.deduplicator.dedup(candidates);
        let head_list: Vec<HeadDetection> = heads.iter().map(|h| h.head).collect();
        let votes = self.aggregator.aggregate(&head_list, &accepted);

        let tally = VoteTally::from_votes(&votes);
        info!(
            "{} heads, {} candidates, {} hands kept: left {}, right {}, abstain {}",
            votes.len(),
            candidate_count,
            accepted.len(),
            tally.left,
            tally.right,
            tally.abstain
        );

        votes
    }

    /// Run the full detection on one image.
    ///
    /// A head whose search region collapses or whose pose query fails still
    /// gets a vote, backed by no hands.
    pub fn detect(&self, frame: FrameSize, detections: &[RawDetection], poses: &mut dyn PoseSource) -> Vec<HeadVote> {
        let heads = self.heads(detections);
        debug!(
            "{} of {} detections kept as heads, querying {}",
            heads.len(),
            detections.len(),
            poses.name()
        );

        let head_poses: Vec<HeadPoses> = heads
            .into_iter()
            .map(|head| {
                let keypoint_sets = match self.pose_request(&head, frame) {
                    Some(request) => match poses.estimate(&request) {
                        Ok(sets) => {
                            let offset = request.region.offset();
                            sets.iter().map(|set| set.translated(offset)).collect()
                        }
                        Err(e) => {
                            warn!("Pose estimation failed for head {}: {}", head.id, e);
                            Vec::new()
                        }
                    },
                    None => Vec::new(),
                };
                HeadPoses { head, keypoint_sets }
            })
            .collect();

        self.classify(&head_poses)
    }

    /// Run the detection and read every head as for or against
    pub fn detect_survey(
        &self,
        frame: FrameSize,
        detections: &[RawDetection],
        poses: &mut dyn PoseSource,
    ) -> Vec<SurveyResult> {
        self.detect(frame, detections, poses)
            .into_iter()
            .map(SurveyResult::from)
            .collect()
    }
}
