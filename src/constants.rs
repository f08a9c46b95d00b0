//! Constants used throughout the library

/// Number of landmarks in a COCO pose keypoint set
pub const NUM_POSE_KEYPOINTS: usize = 17;

/// Values per keypoint in raw pose model output (x, y, confidence)
pub const KEYPOINT_VALUES: usize = 3;

/// Values per row in raw head model output (x1, y1, x2, y2, confidence, class)
pub const HEAD_OUTPUT_VALUES: usize = 6;

/// Per-joint confidence thresholds for a strict arm acceptance
pub const DEFAULT_WRIST_CONF: f32 = 0.60;
pub const DEFAULT_ELBOW_CONF: f32 = 0.50;
pub const DEFAULT_SHOULDER_CONF: f32 = 0.30;

/// Pairwise and total confidence sums for the rescue path
pub const DEFAULT_PAIR_CONF_SUM: f32 = 1.9;
pub const DEFAULT_TOTAL_CONF_SUM: f32 = 1.70;

/// Wrist must be at least this many pixels above the shoulder
pub const RAISE_MARGIN_PX: f32 = 10.0;

/// Forearm angle tolerance, before head-height scaling and clamping
pub const DEFAULT_BASE_ANGLE_DEG: f32 = 75.0;
pub const ANGLE_REFERENCE_HEIGHT: f32 = 150.0;
pub const MIN_ANGLE_DEG: f32 = 50.0;
pub const MAX_ANGLE_DEG: f32 = 90.0;

/// Angle reported when one of the vectors has zero length
pub const DEGENERATE_ANGLE_DEG: f32 = 180.0;

/// Minimum vertical wrist/elbow span, relative to head height
pub const DEFAULT_MIN_WRIST_ELBOW_RATIO: f32 = 0.7;
pub const MIN_WRIST_ELBOW_PX: f32 = 5.0;

/// Pose search region around a head
pub const DEFAULT_HEAD_HEIGHT_MULTIPLIER: f32 = 6.0;
pub const DEFAULT_CROP_VERTICAL_SHIFT: f32 = 1.2;
pub const MIN_CROP_WIDTH_PX: i32 = 10;

/// Pose model query parameters
pub const DEFAULT_POSE_MODEL_CONF: f32 = 0.01;
pub const DEFAULT_POSE_INPUT_SIZE: u32 = 448;

/// Deduplication distances in pixels
pub const DEFAULT_BASE_DEDUP_DIST: f32 = 55.0;
pub const DEDUP_REFERENCE_HEIGHT: f32 = 100.0;
pub const DEFAULT_MIN_DEDUP_DIST: f32 = 20.0;
pub const DEFAULT_SHOULDER_DEDUP_DIST: f32 = 40.0;
pub const DEFAULT_SUPER_STRICT_DIST: f32 = 10.0;
pub const DEFAULT_VERTICAL_ALIGN_TOL: f32 = 20.0;
pub const DEFAULT_VERTICAL_SEARCH_FACTOR: f32 = 1.4;

/// Head detection class and thresholds
pub const DEFAULT_HEAD_CLASS_ID: u32 = 0;
pub const DEFAULT_HEAD_CONF: f32 = 0.25;
pub const DEFAULT_COUNT_CONF: f32 = 0.3;

/// Class ids used by the hand export format
pub const LEFT_HAND_CLASS_ID: u32 = 0;
pub const RIGHT_HAND_CLASS_ID: u32 = 1;
/// Survey exports do not distinguish sides
pub const SURVEY_HAND_CLASS_ID: u32 = 1;

/// Exported hand box side, relative to head height
pub const HAND_BOX_HEAD_RATIO: f32 = 0.5;

/// Evaluation defaults
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MATCHING_RADIUS_RATIO: f32 = 1.0;
pub const DEFAULT_GT_HEAD_CLASS_ID: u32 = 2;

/// Decimal digits in the normalized export format
pub const EXPORT_PRECISION: usize = 6;

/// History log defaults
pub const DEFAULT_HISTORY_FILE: &str = "historique.txt";
pub const HISTORY_DATE_FORMAT: &str = "%d/%m/%y à %Hh%M";
