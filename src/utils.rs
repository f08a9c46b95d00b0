//! Pixel-grid helpers shared by the candidate builder and the pipeline.

use crate::geometry::{BoundingBox, CropRegion, FrameSize};

/// Truncate a coordinate towards zero onto the integer pixel grid.
///
/// Non-finite input saturates the way `as` casts do (NaN becomes 0).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn truncate_px(value: f32) -> i32 {
    value as i32
}

/// Compute the pose search region above and around a head box.
///
/// The region is a square of side `head_height * multiplier`, centred
/// horizontally on the head and shifted up by `head_height * vertical_shift`
/// so that raised arms fit inside, then clamped to the frame.
///
/// Returns `None` when the clamped region is narrower than `min_width` or has
/// no height (head too small or against the image edge).
#[must_use]
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_wrap)]
pub fn crop_around_head(
    bbox: &BoundingBox,
    frame: FrameSize,
    multiplier: f32,
    vertical_shift: f32,
    min_width: i32,
) -> Option<CropRegion> {
    let (x1, y1, x2, y2) = (
        truncate_px(bbox.x1),
        truncate_px(bbox.y1),
        truncate_px(bbox.x2),
        truncate_px(bbox.y2),
    );
    let head_height = y2 - y1;

    let crop_size = truncate_px(head_height as f32 * multiplier);
    let center_x = (x1 + x2).div_euclid(2);
    let center_y = (y1 + y2).div_euclid(2) - truncate_px(head_height as f32 * vertical_shift);
    let half = crop_size.div_euclid(2);

    let max_x = frame.width.min(i32::MAX as u32) as i32;
    let max_y = frame.height.min(i32::MAX as u32) as i32;

    let region = CropRegion {
        x1: (center_x - half).clamp(0, max_x),
        y1: (center_y - half).clamp(0, max_y),
        x2: (center_x + half).clamp(0, max_x),
        y2: (center_y + half).clamp(0, max_y),
    };

    if region.width() < min_width || region.height() <= 0 {
        log::debug!(
            "Search region {:?} for head at ({}, {}) collapsed, skipping pose query",
            region,
            x1,
            y1
        );
        return None;
    }

    Some(region)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameSize {
        FrameSize::new(1000, 800).unwrap()
    }

    #[test]
    fn test_truncate_px() {
        assert_eq!(truncate_px(12.9), 12);
        assert_eq!(truncate_px(-12.9), -12);
        assert_eq!(truncate_px(f32::NAN), 0);
        assert_eq!(truncate_px(f32::INFINITY), i32::MAX);
    }

    #[test]
    fn test_crop_centered_above_head() {
        let bbox = BoundingBox::new(480.0, 500.0, 520.0, 550.0).unwrap();
        let region = crop_around_head(&bbox, frame(), 6.0, 1.2, 10).unwrap();

        // h = 50, crop = 300, centre = (500, 525 - 60 = 465), half = 150
        assert_eq!(region, CropRegion { x1: 350, y1: 315, x2: 650, y2: 615 });
    }

    #[test]
    fn test_crop_clamped_to_frame() {
        let bbox = BoundingBox::new(0.0, 10.0, 40.0, 60.0).unwrap();
        let region = crop_around_head(&bbox, frame(), 6.0, 1.2, 10).unwrap();

        assert_eq!(region.x1, 0);
        assert_eq!(region.y1, 0);
        assert!(region.x2 <= 1000);
        assert!(region.width() >= 10);
    }

    #[test]
    fn test_crop_collapses_at_right_edge() {
        // Head hugging the right border of a narrow frame
        let narrow = FrameSize::new(105, 800).unwrap();
        let bbox = BoundingBox::new(100.0, 400.0, 104.0, 401.0).unwrap();
        assert!(crop_around_head(&bbox, narrow, 6.0, 1.2, 10).is_none());
    }

    #[test]
    fn test_crop_collapses_for_tiny_head() {
        let bbox = BoundingBox::new(500.0, 400.0, 501.0, 401.0).unwrap();
        assert!(crop_around_head(&bbox, frame(), 6.0, 1.2, 10).is_none());
    }
}
