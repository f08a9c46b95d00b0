//! Configuration management for the classroom vote engine

use crate::constants::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration, one immutable value handed to every stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raised-arm validation
    pub hands: HandConfig,

    /// Duplicate hand suppression
    pub dedup: DedupConfig,

    /// Vote mode head selection and aggregation
    pub vote: VoteConfig,

    /// Head counting mode
    pub counting: CountingConfig,

    /// Dataset evaluation
    pub evaluation: EvaluationConfig,

    /// History log
    pub history: HistoryConfig,
}

/// Raised-arm validation thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Minimum wrist confidence for a strict acceptance
    pub wrist_conf_threshold: f32,

    /// Minimum elbow confidence for a strict acceptance
    pub elbow_conf_threshold: f32,

    /// Minimum shoulder confidence for a strict acceptance
    pub shoulder_conf_threshold: f32,

    /// Wrist + elbow sum that rescues a weak arm
    pub pair_wrist_elbow_threshold: f32,

    /// Wrist + shoulder sum that rescues a weak arm
    pub pair_wrist_shoulder_threshold: f32,

    /// Elbow + shoulder sum that rescues a weak arm
    pub pair_elbow_shoulder_threshold: f32,

    /// Three-joint sum below which a rescue is revoked
    pub total_conf_threshold: f32,

    /// Pixels the wrist must be above the shoulder
    pub raise_margin: f32,

    /// Forearm angle tolerance at the reference head height (degrees)
    pub base_angle_deg: f32,

    /// Minimum vertical wrist/elbow span as a fraction of head height
    pub min_wrist_elbow_ratio: f32,

    /// Pose search region side as a multiple of head height
    pub head_height_multiplier: f32,

    /// Upward shift of the search region centre, in head heights
    pub crop_vertical_shift: f32,

    /// Search regions narrower than this are skipped (pixels)
    pub min_crop_width: i32,

    /// Confidence floor passed to the pose model
    pub pose_model_confidence: f32,

    /// Inference size requested from the pose model
    pub pose_input_size: u32,
}

/// Duplicate hand suppression distances (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Wrist merge radius for a 100 px tall head
    pub base_dedup_distance: f32,

    /// Lower bound of the scaled merge radius
    pub min_dedup_distance: f32,

    /// Shoulders farther apart than this belong to different people
    pub shoulder_dedup_distance: f32,

    /// Wrists closer than this are always the same hand
    pub super_strict_distance: f32,

    /// Horizontal tolerance of the vertical corridor test
    pub vertical_align_tolerance: f32,

    /// Vertical reach of the corridor test, in merge radii
    pub vertical_search_factor: f32,
}

/// What a head with both arms raised votes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BothSidesPolicy {
    /// Ambiguous, counted as a non-vote
    #[default]
    Neutral,
    /// Reported as its own `Vote::Both` (still an abstention in tallies)
    Report,
}

/// Vote mode parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    /// Head class in the detector output
    pub head_class_id: u32,

    /// Heads at or below this confidence are ignored
    pub head_confidence_threshold: f32,

    /// Double raise handling
    pub both_sides: BothSidesPolicy,
}

/// Head counting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    /// Boxes must exceed this confidence to be counted
    pub confidence_threshold: f32,

    /// Head class in the detector output
    pub class_id: u32,
}

/// Dataset evaluation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Minimum IoU for a head box match
    pub iou_threshold: f32,

    /// Hand match radius in head heights
    pub matching_radius_ratio: f32,

    /// Head class in ground-truth labels
    pub gt_head_class_id: u32,

    /// Left hand class in ground-truth labels
    pub gt_left_class_id: u32,

    /// Right hand class in ground-truth labels
    pub gt_right_class_id: u32,
}

/// History log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Append-only history file
    pub path: PathBuf,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            wrist_conf_threshold: DEFAULT_WRIST_CONF,
            elbow_conf_threshold: DEFAULT_ELBOW_CONF,
            shoulder_conf_threshold: DEFAULT_SHOULDER_CONF,
            pair_wrist_elbow_threshold: DEFAULT_PAIR_CONF_SUM,
            pair_wrist_shoulder_threshold: DEFAULT_PAIR_CONF_SUM,
            pair_elbow_shoulder_threshold: DEFAULT_PAIR_CONF_SUM,
            total_conf_threshold: DEFAULT_TOTAL_CONF_SUM,
            raise_margin: RAISE_MARGIN_PX,
            base_angle_deg: DEFAULT_BASE_ANGLE_DEG,
            min_wrist_elbow_ratio: DEFAULT_MIN_WRIST_ELBOW_RATIO,
            head_height_multiplier: DEFAULT_HEAD_HEIGHT_MULTIPLIER,
            crop_vertical_shift: DEFAULT_CROP_VERTICAL_SHIFT,
            min_crop_width: MIN_CROP_WIDTH_PX,
            pose_model_confidence: DEFAULT_POSE_MODEL_CONF,
            pose_input_size: DEFAULT_POSE_INPUT_SIZE,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            base_dedup_distance: DEFAULT_BASE_DEDUP_DIST,
            min_dedup_distance: DEFAULT_MIN_DEDUP_DIST,
            shoulder_dedup_distance: DEFAULT_SHOULDER_DEDUP_DIST,
            super_strict_distance: DEFAULT_SUPER_STRICT_DIST,
            vertical_align_tolerance: DEFAULT_VERTICAL_ALIGN_TOL,
            vertical_search_factor: DEFAULT_VERTICAL_SEARCH_FACTOR,
        }
    }
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            head_class_id: DEFAULT_HEAD_CLASS_ID,
            head_confidence_threshold: DEFAULT_HEAD_CONF,
            both_sides: BothSidesPolicy::Neutral,
        }
    }
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_COUNT_CONF,
            class_id: DEFAULT_HEAD_CLASS_ID,
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            matching_radius_ratio: DEFAULT_MATCHING_RADIUS_RATIO,
            gt_head_class_id: DEFAULT_GT_HEAD_CLASS_ID,
            gt_left_class_id: LEFT_HAND_CLASS_ID,
            gt_right_class_id: RIGHT_HAND_CLASS_ID,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_HISTORY_FILE),
        }
    }
}

fn check_unit_range(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("{name} must be between 0.0 and 1.0, got {value}")))
    }
}

fn check_positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("{name} must be greater than 0, got {value}")))
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        let hands = &self.hands;
        check_unit_range("Wrist confidence threshold", hands.wrist_conf_threshold)?;
        check_unit_range("Elbow confidence threshold", hands.elbow_conf_threshold)?;
        check_unit_range("Shoulder confidence threshold", hands.shoulder_conf_threshold)?;
        check_unit_range("Pose model confidence", hands.pose_model_confidence)?;
        check_positive("Wrist/elbow rescue sum", hands.pair_wrist_elbow_threshold)?;
        check_positive("Wrist/shoulder rescue sum", hands.pair_wrist_shoulder_threshold)?;
        check_positive("Elbow/shoulder rescue sum", hands.pair_elbow_shoulder_threshold)?;
        check_positive("Base angle", hands.base_angle_deg)?;
        check_positive("Head height multiplier", hands.head_height_multiplier)?;
        if hands.raise_margin < 0.0 {
            return Err(Error::ConfigError("Raise margin must not be negative".to_string()));
        }
        if hands.min_crop_width <= 0 {
            return Err(Error::ConfigError("Minimum crop width must be greater than 0".to_string()));
        }
        if hands.pose_input_size == 0 {
            return Err(Error::ConfigError("Pose input size must be greater than 0".to_string()));
        }

        let dedup = &self.dedup;
        check_positive("Base dedup distance", dedup.base_dedup_distance)?;
        check_positive("Minimum dedup distance", dedup.min_dedup_distance)?;
        check_positive("Shoulder dedup distance", dedup.shoulder_dedup_distance)?;
        check_positive("Super strict distance", dedup.super_strict_distance)?;
        check_positive("Vertical align tolerance", dedup.vertical_align_tolerance)?;
        check_positive("Vertical search factor", dedup.vertical_search_factor)?;

        check_unit_range("Head confidence threshold", self.vote.head_confidence_threshold)?;
        check_unit_range("Counting confidence threshold", self.counting.confidence_threshold)?;
        check_unit_range("IoU threshold", self.evaluation.iou_threshold)?;
        check_positive("Matching radius ratio", self.evaluation.matching_radius_ratio)?;

        if self.history.path.as_os_str().is_empty() {
            return Err(Error::ConfigError("History path must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Classroom Vote Configuration

# Raised-arm validation
hands:
  wrist_conf_threshold: 0.60
  elbow_conf_threshold: 0.50
  shoulder_conf_threshold: 0.30
  pair_wrist_elbow_threshold: 1.9
  pair_wrist_shoulder_threshold: 1.9
  pair_elbow_shoulder_threshold: 1.9
  total_conf_threshold: 1.70
  raise_margin: 10.0
  base_angle_deg: 75.0
  min_wrist_elbow_ratio: 0.7
  head_height_multiplier: 6.0
  crop_vertical_shift: 1.2
  min_crop_width: 10
  pose_model_confidence: 0.01
  pose_input_size: 448

# Duplicate hand suppression (pixels)
dedup:
  base_dedup_distance: 55.0
  min_dedup_distance: 20.0
  shoulder_dedup_distance: 40.0
  super_strict_distance: 10.0
  vertical_align_tolerance: 20.0
  vertical_search_factor: 1.4

# Vote mode
vote:
  head_class_id: 0
  head_confidence_threshold: 0.25
  both_sides: neutral

# Head counting
counting:
  confidence_threshold: 0.3
  class_id: 0

# Dataset evaluation
evaluation:
  iou_threshold: 0.5
  matching_radius_ratio: 1.0
  gt_head_class_id: 2
  gt_left_class_id: 0
  gt_right_class_id: 1

# History log
history:
  path: "historique.txt"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = serde_yaml::from_str("vote:\n  both_sides: report\n").unwrap();
        assert_eq!(parsed.vote.both_sides, BothSidesPolicy::Report);
        assert_eq!(parsed.vote.head_confidence_threshold, DEFAULT_HEAD_CONF);
        assert_eq!(parsed.hands, HandConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.hands.wrist_conf_threshold = 1.5;
        match config.validate() {
            Err(Error::ConfigError(msg)) => assert!(msg.contains("Wrist")),
            other => panic!("Expected ConfigError, got {other:?}"),
        }

        let mut config = Config::default();
        config.dedup.shoulder_dedup_distance = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.hands.min_crop_width = 0;
        assert!(config.validate().is_err());
    }
}
