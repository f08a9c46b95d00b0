//! Head detections from the external head model.

use crate::constants::HEAD_OUTPUT_VALUES;
use crate::geometry::BoundingBox;
use crate::{Error, Result};
use log::debug;
use ndarray::ArrayView2;

/// One decoded box from the head model, before any filtering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    /// Box in image pixels
    pub bbox: BoundingBox,
    /// Detector confidence (0.0-1.0)
    pub confidence: f32,
    /// Detector class id
    pub class_id: u32,
}

/// A head retained for hand analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadDetection {
    /// Index of the box in the raw detector output for this image
    pub id: usize,
    /// Head box in whole image pixels
    pub bbox: BoundingBox,
    /// Box height; the unit of scale for every later stage
    pub height: f32,
}

impl HeadDetection {
    #[must_use]
    pub fn new(id: usize, bbox: BoundingBox) -> Self {
        Self {
            id,
            bbox,
            height: bbox.height(),
        }
    }
}

/// Keep the raw detections of `class_id` whose confidence exceeds `min_confidence`.
///
/// Ids are the positions in `raw`, so they stay stable for one image even when
/// other classes are interleaved. Boxes are snapped to whole pixels; boxes that
/// collapse doing so are dropped.
#[must_use]
pub fn select_heads(raw: &[RawDetection], class_id: u32, min_confidence: f32) -> Vec<HeadDetection> {
    raw.iter()
        .enumerate()
        .filter(|(_, det)| det.class_id == class_id && det.confidence > min_confidence)
        .filter_map(|(id, det)| match det.bbox.truncated() {
            Ok(bbox) => Some(HeadDetection::new(id, bbox)),
            Err(e) => {
                debug!("Dropping head {}: {}", id, e);
                None
            }
        })
        .collect()
}

/// Decode raw head model output rows `[x1, y1, x2, y2, confidence, class]`.
///
/// Rows with degenerate boxes are skipped.
///
/// # Errors
///
/// Returns an error if rows have fewer than 6 values
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn decode_head_output(output: ArrayView2<f32>) -> Result<Vec<RawDetection>> {
    if output.ncols() < HEAD_OUTPUT_VALUES {
        return Err(Error::InvalidInput(format!(
            "Head output rows must hold {} values, got {}",
            HEAD_OUTPUT_VALUES,
            output.ncols()
        )));
    }

    let mut detections = Vec::with_capacity(output.nrows());
    for (i, row) in output.outer_iter().enumerate() {
        let bbox = match BoundingBox::new(row[0], row[1], row[2], row[3]) {
            Ok(bbox) => bbox,
            Err(e) => {
                debug!("Skipping head output row {}: {}", i, e);
                continue;
            }
        };
        detections.push(RawDetection {
            bbox,
            confidence: row[4],
            class_id: row[5].max(0.0) as u32,
        });
    }

    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn raw(x1: f32, class_id: u32, confidence: f32) -> RawDetection {
        RawDetection {
            bbox: BoundingBox::new(x1, 0.0, x1 + 40.0, 50.0).unwrap(),
            confidence,
            class_id,
        }
    }

    #[test]
    fn test_select_heads_keeps_raw_positions_as_ids() {
        let detections = vec![raw(0.0, 0, 0.9), raw(100.0, 1, 0.9), raw(200.0, 0, 0.8)];
        let heads = select_heads(&detections, 0, 0.25);

        assert_eq!(heads.len(), 2);
        assert_eq!(heads[0].id, 0);
        assert_eq!(heads[1].id, 2);
        assert_eq!(heads[1].height, 50.0);
    }

    #[test]
    fn test_select_heads_threshold_is_strict() {
        let detections = vec![raw(0.0, 0, 0.25), raw(100.0, 0, 0.26)];
        let heads = select_heads(&detections, 0, 0.25);
        assert_eq!(heads.len(), 1);
        assert_eq!(heads[0].id, 1);
    }

    #[test]
    fn test_select_heads_truncates_boxes() {
        let detections = vec![RawDetection {
            bbox: BoundingBox::new(10.6, 20.9, 50.2, 70.7).unwrap(),
            confidence: 0.9,
            class_id: 0,
        }];
        let heads = select_heads(&detections, 0, 0.0);
        assert_eq!(heads[0].bbox, BoundingBox::new(10.0, 20.0, 50.0, 70.0).unwrap());
        assert_eq!(heads[0].height, 50.0);
    }

    #[test]
    fn test_decode_head_output() {
        let output = array![
            [10.0, 20.0, 50.0, 70.0, 0.9, 0.0],
            [10.0, 20.0, 5.0, 70.0, 0.9, 0.0],
            [100.0, 20.0, 150.0, 70.0, 0.4, 2.0],
        ];
        let detections = decode_head_output(output.view()).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[1].class_id, 2);
        assert_eq!(detections[1].confidence, 0.4);
    }

    #[test]
    fn test_decode_head_output_bad_shape() {
        let output = array![[10.0, 20.0, 50.0, 70.0]];
        assert!(decode_head_output(output.view()).is_err());
    }
}
