//! Evaluation against labelled images: box matching for counting, distance
//! matching for hands, and the usual detection metrics.

use crate::annotation::NormalizedBox;
use crate::dedup::AcceptedHand;
use crate::geometry::{FrameSize, Point};
use crate::keypoints::Side;
use std::fmt;
use std::ops::AddAssign;

/// Pixel box corners `(x1, y1, x2, y2)`
pub type PixelBox = (f64, f64, f64, f64);

/// Intersection over union of a ground-truth box `a` and a prediction `b`.
///
/// A prediction lying entirely inside the ground truth scores 1.0.
#[must_use]
pub fn iou(a: PixelBox, b: PixelBox) -> f64 {
    let (ax1, ay1, ax2, ay2) = a;
    let (bx1, by1, bx2, by2) = b;

    if bx1 >= ax1 && by1 >= ay1 && bx2 <= ax2 && by2 <= ay2 {
        return 1.0;
    }

    let inter_w = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
    let inter_h = (ay2.min(by2) - ay1.max(by1)).max(0.0);
    let inter = inter_w * inter_h;
    if inter == 0.0 {
        return 0.0;
    }

    let union = (ax2 - ax1) * (ay2 - ay1) + (bx2 - bx1) * (by2 - by1) - inter;
    if union == 0.0 {
        return 0.0;
    }
    inter / union
}

/// True positive, false positive and false negative counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl Metrics {
    #[must_use]
    pub const fn new(tp: usize, fp: usize, fn_: usize) -> Self {
        Self { tp, fp, fn_ }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn precision(&self) -> f64 {
        let denom = self.tp + self.fp;
        if denom == 0 {
            0.0
        } else {
            self.tp as f64 / denom as f64
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn recall(&self) -> f64 {
        let denom = self.tp + self.fn_;
        if denom == 0 {
            0.0
        } else {
            self.tp as f64 / denom as f64
        }
    }

    #[must_use]
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TP={} FP={} FN={} | Precision {:.4} | Recall {:.4} | F1 {:.4}",
            self.tp,
            self.fp,
            self.fn_,
            self.precision(),
            self.recall(),
            self.f1()
        )
    }
}

/// Greedy one-to-one box matching.
///
/// Each ground-truth box takes the unused prediction with the best positive
/// IoU; the pair counts as a true positive when that IoU reaches the
/// threshold.
#[must_use]
pub fn match_boxes(ground_truth: &[PixelBox], predictions: &[PixelBox], iou_threshold: f64) -> Metrics {
    let mut used = vec![false; predictions.len()];
    let mut tp = 0;

    for gt in ground_truth {
        let mut best: Option<(usize, f64)> = None;
        for (i, pred) in predictions.iter().enumerate() {
            if used[i] {
                continue;
            }
            let score = iou(*gt, *pred);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((i, score));
            }
        }

        if let Some((i, score)) = best {
            if score >= iou_threshold {
                tp += 1;
                used[i] = true;
            }
        }
    }

    let matched = used.iter().filter(|u| **u).count();
    Metrics::new(tp, predictions.len() - matched, ground_truth.len() - tp)
}

/// A labelled hand position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTruthHand {
    pub position: Point,
    pub side: Side,
}

/// Hand matching results, overall and per side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideMetrics {
    pub overall: Metrics,
    pub left: Metrics,
    pub right: Metrics,
}

impl AddAssign for SideMetrics {
    fn add_assign(&mut self, other: Self) {
        self.overall += other.overall;
        self.left += other.left;
        self.right += other.right;
    }
}

impl SideMetrics {
    fn side_mut(&mut self, side: Side) -> &mut Metrics {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Side-aware hand matching for vote mode.
///
/// Each ground-truth hand takes the closest unused prediction of the same side
/// lying strictly within `head_height * radius_ratio` of it, the head height
/// being the one the prediction was measured against. Unmatched predictions
/// are false positives of their own side.
#[must_use]
pub fn match_hands(ground_truth: &[GroundTruthHand], predictions: &[AcceptedHand], radius_ratio: f32) -> SideMetrics {
    let mut used = vec![false; predictions.len()];
    let mut metrics = SideMetrics::default();

    for gt in ground_truth {
        let mut best: Option<(usize, f32)> = None;
        for (i, pred) in predictions.iter().enumerate() {
            let candidate = &pred.candidate;
            if used[i] || candidate.side != gt.side {
                continue;
            }
            let dist = gt.position.distance(&candidate.wrist);
            let radius = candidate.source_head_height * radius_ratio;
            if dist < radius && best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }

        if let Some((i, _)) = best {
            used[i] = true;
            metrics.side_mut(gt.side).tp += 1;
        } else {
            metrics.side_mut(gt.side).fn_ += 1;
        }
    }

    for (pred, _) in predictions.iter().zip(&used).filter(|(_, u)| !**u) {
        metrics.side_mut(pred.candidate.side).fp += 1;
    }

    metrics.overall = Metrics::new(
        metrics.left.tp + metrics.right.tp,
        metrics.left.fp + metrics.right.fp,
        metrics.left.fn_ + metrics.right.fn_,
    );
    metrics
}

/// Side-blind hand matching for survey mode.
///
/// Each prediction takes its nearest unused ground-truth hand and counts as a
/// true positive when the distance is within the prediction's head height
/// times `radius_ratio`.
#[must_use]
pub fn match_raised_hands(ground_truth: &[Point], predictions: &[AcceptedHand], radius_ratio: f32) -> Metrics {
    let mut used = vec![false; ground_truth.len()];
    let mut tp = 0;

    for pred in predictions {
        let candidate = &pred.candidate;
        let nearest = ground_truth
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, gt)| (i, gt.distance(&candidate.wrist)))
            .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            });

        if let Some((i, dist)) = nearest {
            if dist <= candidate.source_head_height * radius_ratio {
                used[i] = true;
                tp += 1;
            }
        }
    }

    Metrics::new(tp, predictions.len() - tp, ground_truth.len() - tp)
}

/// Pixel boxes of the labels of one class
#[must_use]
pub fn ground_truth_boxes(labels: &[NormalizedBox], class_id: u32, frame: FrameSize) -> Vec<PixelBox> {
    labels
        .iter()
        .filter(|b| b.class_id == class_id)
        .map(|b| b.to_pixels(frame))
        .collect()
}

/// Labelled hands of the two hand classes
#[must_use]
pub fn ground_truth_hands(
    labels: &[NormalizedBox],
    left_class_id: u32,
    right_class_id: u32,
    frame: FrameSize,
) -> Vec<GroundTruthHand> {
    labels
        .iter()
        .filter_map(|b| {
            let side = if b.class_id == left_class_id {
                Side::Left
            } else if b.class_id == right_class_id {
                Side::Right
            } else {
                return None;
            };
            Some(GroundTruthHand {
                position: b.center_pixels(frame),
                side,
            })
        })
        .collect()
}
