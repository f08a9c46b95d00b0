//! Greedy suppression of duplicate hand candidates.
//!
//! Overlapping search regions make the pose model report the same arm several
//! times, sometimes attributed to a neighbouring head. Candidates are ranked by
//! wrist confidence and accepted greedily; a candidate close enough to an
//! already accepted hand is dropped.

use crate::config::DedupConfig;
use crate::hand_candidate::HandCandidate;
use log::debug;

/// A candidate that survived deduplication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedHand {
    pub candidate: HandCandidate,
    /// Acceptance order within the image, 0 being the most confident hand
    pub rank: usize,
}

/// Duplicate hand suppression for one image
#[derive(Debug, Clone, Copy, Default)]
pub struct HandDeduplicator {
    config: DedupConfig,
}

impl HandDeduplicator {
    #[must_use]
    pub const fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Accept candidates in descending confidence order, dropping duplicates.
    ///
    /// The sort is stable, so candidates of equal confidence keep their
    /// input order. NaN confidences sort ahead of every finite one.
    #[must_use]
    pub fn dedup(&self, mut candidates: Vec<HandCandidate>) -> Vec<AcceptedHand> {
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut accepted: Vec<AcceptedHand> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self.is_duplicate(&candidate, &accepted) {
                continue;
            }
            let rank = accepted.len();
            accepted.push(AcceptedHand { candidate, rank });
        }

        accepted
    }

    /// Whether `candidate` repeats one of the `accepted` hands.
    ///
    /// Accepted hands are checked in order and the first decisive rule wins:
    /// near-identical wrists always merge, distant shoulders mean another
    /// person, otherwise wrists within the larger merge radius or stacked in a
    /// narrow vertical corridor merge.
    #[must_use]
    pub fn is_duplicate(&self, candidate: &HandCandidate, accepted: &[AcceptedHand]) -> bool {
        let cfg = &self.config;

        for hand in accepted {
            let other = &hand.candidate;
            let wrist_dist = candidate.wrist.distance(&other.wrist);

            if wrist_dist < cfg.super_strict_distance {
                debug!(
                    "Suppressed {:?} hand of head {}: wrist {:.1}px from hand #{}",
                    candidate.side, candidate.head_id, wrist_dist, hand.rank
                );
                return true;
            }

            if candidate.shoulder.distance(&other.shoulder) > cfg.shoulder_dedup_distance {
                continue;
            }

            let radius = candidate.dedup_distance.max(other.dedup_distance);
            if wrist_dist < radius {
                debug!(
                    "Suppressed {:?} hand of head {}: within {:.0}px of hand #{}",
                    candidate.side, candidate.head_id, radius, hand.rank
                );
                return true;
            }

            let dx = (candidate.wrist.x - other.wrist.x).abs();
            let dy = (candidate.wrist.y - other.wrist.y).abs();
            if dx < cfg.vertical_align_tolerance && dy < radius * cfg.vertical_search_factor {
                debug!(
                    "Suppressed {:?} hand of head {}: stacked above hand #{}",
                    candidate.side, candidate.head_id, hand.rank
                );
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::hand_candidate::Acceptance;
    use crate::keypoints::Side;

    fn candidate(wrist: (f32, f32), shoulder: (f32, f32), confidence: f32, head_id: usize) -> HandCandidate {
        HandCandidate {
            wrist: Point::new(wrist.0, wrist.1),
            elbow: Point::new(wrist.0, wrist.1 + 50.0),
            shoulder: Point::new(shoulder.0, shoulder.1),
            nose: Point::new(shoulder.0, shoulder.1 - 40.0),
            confidence,
            side: Side::Left,
            head_id,
            dedup_distance: 27.0,
            source_head_height: 50.0,
            acceptance: Acceptance::Strict,
        }
    }

    #[test]
    fn test_super_strict_collapse_ignores_shoulders() {
        let dedup = HandDeduplicator::default();
        // Shoulders 200px apart, wrists 5px apart
        let hands = dedup.dedup(vec![
            candidate((100.0, 100.0), (100.0, 200.0), 0.9, 0),
            candidate((104.0, 103.0), (300.0, 200.0), 0.8, 1),
        ]);
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].candidate.head_id, 0);
    }

    #[test]
    fn test_distant_shoulders_are_different_people() {
        let dedup = HandDeduplicator::default();
        let hands = dedup.dedup(vec![
            candidate((100.0, 100.0), (100.0, 200.0), 0.9, 0),
            candidate((120.0, 100.0), (160.0, 200.0), 0.8, 1),
        ]);
        assert_eq!(hands.len(), 2);
    }

    #[test]
    fn test_merge_radius_uses_larger_distance() {
        let dedup = HandDeduplicator::default();
        let mut far = candidate((130.0, 100.0), (110.0, 200.0), 0.8, 1);
        far.dedup_distance = 20.0;
        // 30px apart: outside 27 but inside 35
        let mut near = candidate((100.0, 100.0), (100.0, 200.0), 0.9, 0);
        near.dedup_distance = 35.0;

        let hands = dedup.dedup(vec![far, near]);
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].candidate.confidence, 0.9);
    }

    #[test]
    fn test_vertical_corridor() {
        let dedup = HandDeduplicator::default();
        // dx 15 < 20, dy 35 < 27 * 1.4 = 37.8, distance 38 > 27
        let hands = dedup.dedup(vec![
            candidate((100.0, 100.0), (100.0, 200.0), 0.9, 0),
            candidate((115.0, 135.0), (105.0, 200.0), 0.8, 0),
        ]);
        assert_eq!(hands.len(), 1);

        // dy 40 is outside the corridor
        let hands = dedup.dedup(vec![
            candidate((100.0, 100.0), (100.0, 200.0), 0.9, 0),
            candidate((115.0, 140.0), (105.0, 200.0), 0.8, 0),
        ]);
        assert_eq!(hands.len(), 2);
    }

    #[test]
    fn test_ranks_follow_confidence() {
        let dedup = HandDeduplicator::default();
        let hands = dedup.dedup(vec![
            candidate((100.0, 100.0), (100.0, 200.0), 0.6, 0),
            candidate((500.0, 100.0), (500.0, 200.0), 0.95, 1),
            candidate((900.0, 100.0), (900.0, 200.0), 0.7, 2),
        ]);
        let heads: Vec<usize> = hands.iter().map(|h| h.candidate.head_id).collect();
        assert_eq!(heads, vec![1, 2, 0]);
        let ranks: Vec<usize> = hands.iter().map(|h| h.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_equal_confidence_keeps_input_order() {
        let dedup = HandDeduplicator::default();
        let hands = dedup.dedup(vec![
            candidate((100.0, 100.0), (100.0, 200.0), 0.8, 7),
            candidate((103.0, 100.0), (100.0, 200.0), 0.8, 3),
        ]);
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].candidate.head_id, 7);
    }

    #[test]
    fn test_nan_confidence_keeps_order_total() {
        let dedup = HandDeduplicator::default();
        let hands = dedup.dedup(vec![
            candidate((100.0, 100.0), (100.0, 200.0), 0.5, 0),
            candidate((400.0, 100.0), (400.0, 200.0), f32::NAN, 1),
            candidate((700.0, 100.0), (700.0, 200.0), 0.9, 2),
            candidate((1000.0, 100.0), (1000.0, 200.0), 0.7, 3),
        ]);

        let heads: Vec<usize> = hands.iter().map(|h| h.candidate.head_id).collect();
        assert_eq!(heads, vec![1, 2, 3, 0]);
        let ranks: Vec<usize> = hands.iter().map(|h| h.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_input() {
        assert!(HandDeduplicator::default().dedup(Vec::new()).is_empty());
    }
}
