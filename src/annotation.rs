//! Normalized box annotations: `<class_id> <xc> <yc> <w> <h>` per line.
//!
//! Coordinates are relative to the image size. This is the format of the
//! dataset labels and of the prediction exports, so evaluation can compare
//! the two directly.

use crate::constants::{EXPORT_PRECISION, HAND_BOX_HEAD_RATIO, LEFT_HAND_CLASS_ID, RIGHT_HAND_CLASS_ID};
use crate::dedup::AcceptedHand;
use crate::geometry::{BoundingBox, FrameSize, Point};
use crate::keypoints::Side;
use crate::{Error, Result};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Fields per annotation line
const FIELDS: usize = 5;

/// One normalized box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    /// Normalize a pixel box against the frame
    #[must_use]
    pub fn from_pixel_box(class_id: u32, bbox: &BoundingBox, frame: FrameSize) -> Self {
        let (w, h) = (f64::from(frame.width), f64::from(frame.height));
        let (x1, y1, x2, y2) = (
            f64::from(bbox.x1),
            f64::from(bbox.y1),
            f64::from(bbox.x2),
            f64::from(bbox.y2),
        );
        Self {
            class_id,
            x_center: (x1 + x2) / 2.0 / w,
            y_center: (y1 + y2) / 2.0 / h,
            width: (x2 - x1) / w,
            height: (y2 - y1) / h,
        }
    }

    /// Square box centred on an accepted hand's wrist.
    ///
    /// Its side is half the owning head height, normalized by the image
    /// height for both dimensions.
    #[must_use]
    pub fn for_hand(hand: &AcceptedHand, frame: FrameSize) -> Self {
        let candidate = &hand.candidate;
        let class_id = match candidate.side {
            Side::Left => LEFT_HAND_CLASS_ID,
            Side::Right => RIGHT_HAND_CLASS_ID,
        };
        let size = f64::from(candidate.source_head_height * HAND_BOX_HEAD_RATIO) / f64::from(frame.height);

        Self {
            class_id,
            x_center: f64::from(candidate.wrist.x) / f64::from(frame.width),
            y_center: f64::from(candidate.wrist.y) / f64::from(frame.height),
            width: size,
            height: size,
        }
    }

    /// Same box under another class id
    #[must_use]
    pub const fn with_class(self, class_id: u32) -> Self {
        Self { class_id, ..self }
    }

    /// Format as one annotation line (no trailing newline)
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} {:.p$} {:.p$} {:.p$} {:.p$}",
            self.class_id,
            self.x_center,
            self.y_center,
            self.width,
            self.height,
            p = EXPORT_PRECISION
        )
    }

    /// Parse one annotation line.
    ///
    /// Lines that do not hold exactly five fields are not annotations and
    /// yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseError` if a field is not a number
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != FIELDS {
            return Ok(None);
        }

        let mut values = [0.0f64; FIELDS];
        for (value, field) in values.iter_mut().zip(&fields) {
            *value = field
                .parse()
                .map_err(|e| Error::ParseError(format!("Invalid number '{field}' in '{line}': {e}")))?;
        }

        Ok(Some(Self {
            class_id: values[0].max(0.0) as u32,
            x_center: values[1],
            y_center: values[2],
            width: values[3],
            height: values[4],
        }))
    }

    /// Corner coordinates in pixels `(x1, y1, x2, y2)`
    #[must_use]
    pub fn to_pixels(&self, frame: FrameSize) -> (f64, f64, f64, f64) {
        let (w, h) = (f64::from(frame.width), f64::from(frame.height));
        (
            (self.x_center - self.width / 2.0) * w,
            (self.y_center - self.height / 2.0) * h,
            (self.x_center + self.width / 2.0) * w,
            (self.y_center + self.height / 2.0) * h,
        )
    }

    /// Centre in pixels
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn center_pixels(&self, frame: FrameSize) -> Point {
        Point::new(
            (self.x_center * f64::from(frame.width)) as f32,
            (self.y_center * f64::from(frame.height)) as f32,
        )
    }
}

/// Write one line per box
///
/// # Errors
///
/// Returns an error if the writer fails
pub fn write_annotations<W: Write>(mut out: W, boxes: &[NormalizedBox]) -> Result<()> {
    for b in boxes {
        writeln!(out, "{}", b.to_line())?;
    }
    out.flush()?;
    Ok(())
}

/// Read every annotation line, skipping lines of the wrong arity
///
/// # Errors
///
/// Returns an error if reading fails or a field is not a number
pub fn read_annotations<R: BufRead>(reader: R) -> Result<Vec<NormalizedBox>> {
    let mut boxes = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        match NormalizedBox::parse_line(&line)? {
            Some(b) => boxes.push(b),
            None if line.trim().is_empty() => {}
            None => debug!("Skipping annotation line {}: '{}'", number + 1, line),
        }
    }
    Ok(boxes)
}

/// Write annotations to a file, replacing it
///
/// # Errors
///
/// Returns an error if the file cannot be created or written
pub fn save_annotations<P: AsRef<Path>>(path: P, boxes: &[NormalizedBox]) -> Result<()> {
    let file = File::create(path)?;
    write_annotations(BufWriter::new(file), boxes)
}

/// Load annotations from a file
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed
pub fn load_annotations<P: AsRef<Path>>(path: P) -> Result<Vec<NormalizedBox>> {
    let file = File::open(path)?;
    read_annotations(BufReader::new(file))
}
