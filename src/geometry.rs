//! Planar geometry over pixel coordinates: points, boxes, crop regions and angles.

use crate::constants::DEGENERATE_ANGLE_DEG;
use crate::{Error, Result};

/// A point in image pixel coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Vector from `self` to `other`
    #[must_use]
    pub fn vector_to(&self, other: &Self) -> (f32, f32) {
        (other.x - self.x, other.y - self.y)
    }
}

/// Width and height of the analysed image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl FrameSize {
    /// Create a frame size, rejecting empty images
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!(
                "Frame must not be empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }
}

/// Axis-aligned box in pixel coordinates, corners (x1, y1) top-left and (x2, y2) bottom-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
    /// Right edge
    pub x2: f32,
    /// Bottom edge
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box, checking `x1 < x2` and `y1 < y2`
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate is not finite or the box is empty
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "Box coordinates must be finite: ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        if x1 >= x2 || y1 >= y2 {
            return Err(Error::InvalidInput(format!(
                "Box must satisfy x1 < x2 and y1 < y2: ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Snap all corners to whole pixels (towards zero)
    ///
    /// # Errors
    ///
    /// Returns an error if the snapped box collapses
    pub fn truncated(&self) -> Result<Self> {
        Self::new(self.x1.trunc(), self.y1.trunc(), self.x2.trunc(), self.y2.trunc())
    }

    /// Box width
    #[must_use]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Box height
    #[must_use]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Box area
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Box centre
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Whether the point lies inside the box, edges included
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        self.x1 <= point.x && point.x <= self.x2 && self.y1 <= point.y && point.y <= self.y2
    }
}

/// Integer pixel region of the image handed to the pose model.
///
/// Corners follow slicing semantics: `x1..x2`, `y1..y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    /// Left edge (inclusive)
    pub x1: i32,
    /// Top edge (inclusive)
    pub y1: i32,
    /// Right edge (exclusive)
    pub x2: i32,
    /// Bottom edge (exclusive)
    pub y2: i32,
}

impl CropRegion {
    /// Region width
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    /// Region height
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Offset to add to region-local coordinates to get image coordinates
    #[must_use]
    pub const fn offset(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    /// Whether an image-frame point falls inside the region
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x1 as f32
            && point.x < self.x2 as f32
            && point.y >= self.y1 as f32
            && point.y < self.y2 as f32
    }
}

/// Angle between two vectors in degrees.
///
/// Returns 180° when either vector has zero length.
#[must_use]
pub fn angle_between(a: (f32, f32), b: (f32, f32)) -> f32 {
    let norm_a = a.0.hypot(a.1);
    let norm_b = b.0.hypot(b.1);
    if norm_a == 0.0 || norm_b == 0.0 {
        return DEGENERATE_ANGLE_DEG;
    }
    let cos = ((a.0 * b.0 + a.1 * b.1) / (norm_a * norm_b)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
