//! Head counting mode: count confident head boxes and export them.

use crate::annotation::{write_annotations, NormalizedBox};
use crate::config::CountingConfig;
use crate::detection::RawDetection;
use crate::geometry::{BoundingBox, FrameSize};
use crate::{Error, Result};
use log::info;
use std::io::Write;

/// Outcome of one count
#[derive(Debug, Clone, PartialEq)]
pub struct CountResult {
    pub count: usize,
    /// Boxes that were counted, in detector order
    pub boxes: Vec<BoundingBox>,
}

/// Counts heads in one image at a time.
///
/// The last result is kept so it can be exported afterwards.
#[derive(Debug, Clone, Default)]
pub struct HeadCounter {
    config: CountingConfig,
    last: Option<(CountResult, FrameSize)>,
}

impl HeadCounter {
    #[must_use]
    pub const fn new(config: CountingConfig) -> Self {
        Self { config, last: None }
    }

    /// Count the detections of the head class above the confidence threshold
    pub fn count(&mut self, detections: &[RawDetection], frame: FrameSize) -> CountResult {
        let boxes: Vec<BoundingBox> = detections
            .iter()
            .filter(|det| det.class_id == self.config.class_id && det.confidence > self.config.confidence_threshold)
            .map(|det| det.bbox)
            .collect();

        let result = CountResult {
            count: boxes.len(),
            boxes,
        };
        info!(
            "Counted {} heads out of {} detections",
            result.count,
            detections.len()
        );

        self.last = Some((result.clone(), frame));
        result
    }

    /// Result of the most recent count
    #[must_use]
    pub fn last_result(&self) -> Option<&CountResult> {
        self.last.as_ref().map(|(result, _)| result)
    }

    /// Write the counted boxes of the last image as normalized annotations
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if nothing has been counted yet, or an
    /// I/O error if the writer fails
    pub fn export_predictions<W: Write>(&self, out: W) -> Result<()> {
        let (result, frame) = self
            .last
            .as_ref()
            .ok_or_else(|| Error::InvalidState("count() must be called before export_predictions()".to_string()))?;

        let boxes: Vec<NormalizedBox> = result
            .boxes
            .iter()
            .map(|bbox| NormalizedBox::from_pixel_box(self.config.class_id, bbox, *frame))
            .collect();

        write_annotations(out, &boxes)
    }
}
