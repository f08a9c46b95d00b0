//! Per-head vote aggregation and image-level tallies.

use crate::config::BothSidesPolicy;
use crate::dedup::AcceptedHand;
use crate::detection::HeadDetection;
use crate::geometry::BoundingBox;
use crate::keypoints::Side;
use std::fmt;

/// What one head voted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vote {
    /// Only the left arm is raised (option A)
    Left,
    /// Only the right arm is raised (option B)
    Right,
    /// No raised arm, or an ambiguous double raise
    Neutral,
    /// Both arms raised, reported under [`BothSidesPolicy::Report`]
    Both,
}

impl Vote {
    /// Whether this vote picks an option
    #[must_use]
    pub const fn is_decisive(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Neutral => "neutral",
            Self::Both => "both",
        };
        f.write_str(label)
    }
}

/// The vote of one head with the hands backing it
#[derive(Debug, Clone, PartialEq)]
pub struct HeadVote {
    pub head_id: usize,
    pub head_box: BoundingBox,
    pub vote: Vote,
    /// Accepted hands of this head, in acceptance order
    pub hands: Vec<AcceptedHand>,
}

/// Reduces accepted hands to one vote per head
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteAggregator {
    policy: BothSidesPolicy,
}

impl VoteAggregator {
    #[must_use]
    pub const fn new(policy: BothSidesPolicy) -> Self {
        Self { policy }
    }

    /// One vote per head, in input head order.
    ///
    /// Hands whose `head_id` matches no head are ignored.
    #[must_use]
    pub fn aggregate(&self, heads: &[HeadDetection], accepted: &[AcceptedHand]) -> Vec<HeadVote> {
        heads
            .iter()
            .map(|head| {
                let hands: Vec<AcceptedHand> = accepted
                    .iter()
                    .filter(|hand| hand.candidate.head_id == head.id)
                    .copied()
                    .collect();
                let vote = self.reduce(&hands);

                HeadVote {
                    head_id: head.id,
                    head_box: head.bbox,
                    vote,
                    hands,
                }
            })
            .collect()
    }

    fn reduce(&self, hands: &[AcceptedHand]) -> Vote {
        let has = |side| hands.iter().any(|hand| hand.candidate.side == side);

        match (has(Side::Left), has(Side::Right)) {
            (true, false) => Vote::Left,
            (false, true) => Vote::Right,
            (false, false) => Vote::Neutral,
            (true, true) => match self.policy {
                BothSidesPolicy::Neutral => Vote::Neutral,
                BothSidesPolicy::Report => Vote::Both,
            },
        }
    }
}

/// Vote counts for one image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub left: usize,
    pub right: usize,
    /// Every head that did not pick an option
    pub abstain: usize,
}

impl VoteTally {
    #[must_use]
    pub fn from_votes(votes: &[HeadVote]) -> Self {
        votes.iter().fold(Self::default(), |mut tally, head| {
            match head.vote {
                Vote::Left => tally.left += 1,
                Vote::Right => tally.right += 1,
                Vote::Neutral | Vote::Both => tally.abstain += 1,
            }
            tally
        })
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.left + self.right + self.abstain
    }

    #[must_use]
    pub fn left_percent(&self) -> f64 {
        percent(self.left, self.total())
    }

    #[must_use]
    pub fn right_percent(&self) -> f64 {
        percent(self.right, self.total())
    }

    #[must_use]
    pub fn abstain_percent(&self) -> f64 {
        percent(self.abstain, self.total())
    }
}

/// `part / total` as a percentage, 0 for an empty total
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
