//! Property tests for deduplication and vote classification


use classroom_vote::config::Config;
use classroom_vote::dedup::HandDeduplicator;
use classroom_vote::hand_candidate::HandCandidate;
use classroom_vote::pipeline::HandRaiseDetector;
use classroom_vote::vote::Vote;
use proptest::prelude::*;
use std::collections::HashSet;
use test_helpers::{candidate, head, head_poses, mirror_head, mirror_set, pose_for, Raise};

const FRAME_WIDTH: f32 = 2000.0;

fn arb_candidate() -> impl Strategy<Value = HandCandidate> {
    (0u16..600, 0u16..400, 0u16..600, 0u16..400, 60u8..=100, 20u8..80).prop_map(|(wx, wy, sx, sy, conf, dist)| {
        candidate(
            (f32::from(wx), f32::from(wy)),
            (f32::from(sx), f32::from(sy)),
            f32::from(conf) / 100.0,
            f32::from(dist),
        )
    })
}

fn arb_raise() -> impl Strategy<Value = Raise> {
    prop_oneof![Just(Raise::None), Just(Raise::Left), Just(Raise::Right), Just(Raise::Both)]
}

/// Up to 10 students on a row, with head height, raise and wrist confidence
fn arb_classroom() -> impl Strategy<Value = Vec<(u8, Raise, u8)>> {
    prop::collection::vec((30u8..90, arb_raise(), 60u8..=100), 0..10)
}

fn mirrored_vote(vote: Vote) -> Vote {
    match vote {
        Vote::Left => Vote::Right,
        Vote::Right => Vote::Left,
        other => other,
    }
}

proptest! {
    #[test]
    fn prop_dedup_is_idempotent(candidates in prop::collection::vec(arb_candidate(), 0..30)) {
        let dedup = HandDeduplicator::default();
        let once = dedup.dedup(candidates);
        let twice = dedup.dedup(once.iter().map(|h| h.candidate).collect());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_accepted_hands_are_in_confidence_order(candidates in prop::collection::vec(arb_candidate(), 0..30)) {
        let accepted = HandDeduplicator::default().dedup(candidates);
        for (i, pair) in accepted.windows(2).enumerate() {
            prop_assert!(pair[0].candidate.confidence >= pair[1].candidate.confidence);
            prop_assert_eq!(pair[0].rank, i);
        }
    }

    #[test]
    fn prop_accepted_hands_are_not_duplicates(candidates in prop::collection::vec(arb_candidate(), 0..30)) {
        let dedup = HandDeduplicator::default();
        let accepted = dedup.dedup(candidates);
        for (i, hand) in accepted.iter().enumerate() {
            prop_assert!(!dedup.is_duplicate(&hand.candidate, &accepted[..i]));
        }
    }

    #[test]
    fn prop_no_orphaned_hands(students in arb_classroom()) {
        let detector = HandRaiseDetector::new(Config::default()).unwrap();
        let entries: Vec<_> = students
            .iter()
            .enumerate()
            .map(|(i, (h, raise, conf))| {
                // Ids with gaps, as when other classes are interleaved
                let head = head(i * 2 + 1, 100.0 + i as f32 * 180.0, 400.0, f32::from(*h));
                (head, vec![pose_for(&head, *raise, f32::from(*conf) / 100.0)])
            })
            .collect();

        let votes = detector.classify(&head_poses(&entries));
        prop_assert_eq!(votes.len(), entries.len());

        let ids: HashSet<usize> = entries.iter().map(|(h, _)| h.id).collect();
        let mut ranks = HashSet::new();
        for vote in &votes {
            for hand in &vote.hands {
                prop_assert!(ids.contains(&hand.candidate.head_id));
                prop_assert_eq!(hand.candidate.head_id, vote.head_id);
                // Each accepted hand shows up under exactly one head
                prop_assert!(ranks.insert(hand.rank));
            }
        }
    }

    #[test]
    fn prop_mirror_symmetry(students in arb_classroom()) {
        let detector = HandRaiseDetector::new(Config::default()).unwrap();
        let axis = FRAME_WIDTH / 2.0;

        let entries: Vec<_> = students
            .iter()
            .enumerate()
            .map(|(i, (h, raise, conf))| {
                let head = head(i, 100.0 + i as f32 * 180.0, 400.0, f32::from(*h));
                (head, vec![pose_for(&head, *raise, f32::from(*conf) / 100.0)])
            })
            .collect();
        let mirrored: Vec<_> = entries
            .iter()
            .map(|(head, sets)| (mirror_head(head, axis), sets.iter().map(|s| mirror_set(s, axis)).collect::<Vec<_>>()))
            .collect();

        let votes = detector.classify(&head_poses(&entries));
        let mirrored_votes = detector.classify(&head_poses(&mirrored));

        prop_assert_eq!(votes.len(), mirrored_votes.len());
        for (vote, mirrored) in votes.iter().zip(&mirrored_votes) {
            prop_assert_eq!(mirrored_vote(vote.vote), mirrored.vote);
            prop_assert_eq!(vote.hands.len(), mirrored.hands.len());
        }
    }

    #[test]
    fn prop_raised_arm_is_found(h in 30u8..90, conf in 60u8..=100) {
        let detector = HandRaiseDetector::new(Config::default()).unwrap();
        let head = head(0, 500.0, 400.0, f32::from(h));
        let votes = detector.classify(&head_poses(&[(head, vec![pose_for(&head, Raise::Right, f32::from(conf) / 100.0)])]));
        prop_assert_eq!(votes[0].vote, Vote::Right);
    }
}
