//! For/against reading of the hand-raise votes.

use crate::dedup::AcceptedHand;
use crate::geometry::BoundingBox;
use crate::vote::{percent, HeadVote};

/// Survey answer of one head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurveyAnswer {
    /// Exactly one arm raised, either side
    For,
    /// Anything else.
    ///
    /// A head without a raised arm cannot be told apart from a head whose arms
    /// were not found, so an undetected person counts as against. A double
    /// raise also lands here.
    Against,
}

/// Survey reading of one head vote
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyResult {
    pub head_id: usize,
    pub head_box: BoundingBox,
    pub answer: SurveyAnswer,
    pub hands: Vec<AcceptedHand>,
}

impl From<HeadVote> for SurveyResult {
    fn from(head: HeadVote) -> Self {
        let answer = if head.vote.is_decisive() {
            SurveyAnswer::For
        } else {
            SurveyAnswer::Against
        };
        Self {
            head_id: head.head_id,
            head_box: head.head_box,
            answer,
            hands: head.hands,
        }
    }
}

/// For/against counts of one image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurveyTally {
    pub pour: usize,
    pub contre: usize,
}

impl SurveyTally {
    #[must_use]
    pub fn from_results(results: &[SurveyResult]) -> Self {
        let pour = results.iter().filter(|r| r.answer == SurveyAnswer::For).count();
        Self {
            pour,
            contre: results.len() - pour,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.pour + self.contre
    }

    #[must_use]
    pub fn pour_percent(&self) -> f64 {
        percent(self.pour, self.total())
    }

    #[must_use]
    pub fn contre_percent(&self) -> f64 {
        percent(self.contre, self.total())
    }
}
