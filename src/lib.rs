//! Classroom hand-raise vote engine.
//!
//! This library counts students and reads raised-hand votes in classroom
//! photographs. It works on the outputs of two external models:
//! - a head detector giving one box per person
//! - a pose model giving 17 COCO keypoints per person, queried per head
//!
//! The vote pipeline consists of:
//! 1. Selecting confident head boxes and cutting a search region above each one
//! 2. Validating each arm geometrically and by keypoint confidence
//! 3. Suppressing duplicate hands reported through overlapping regions
//! 4. Reducing the surviving hands to one vote per head (left, right, neutral)
//!
//! # Examples
//!
//! ## Voting on a recorded scene
//!
//! ```no_run
//! use classroom_vote::{config::Config, pipeline::HandRaiseDetector, scene::Scene, vote::VoteTally};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scene = Scene::from_file("scenes/amphi.yaml")?;
//! let detector = HandRaiseDetector::new(Config::default())?;
//!
//! let mut poses = scene.recorded_poses()?;
//! let votes = detector.detect(scene.frame()?, &scene.raw_detections()?, &mut poses);
//!
//! for head in &votes {
//!     println!("Head {}: {}", head.head_id, head.vote);
//! }
//!
//! let tally = VoteTally::from_votes(&votes);
//! println!("Option A: {:.1}%, option B: {:.1}%", tally.left_percent(), tally.right_percent());
//! # Ok(())
//! # }
//! ```
//!
//! ## Plugging in a pose model
//!
//! ```no_run
//! use classroom_vote::keypoints::KeypointSet;
//! use classroom_vote::pipeline::{PoseRequest, PoseSource};
//! use classroom_vote::Result;
//!
//! struct MyModel;
//!
//! impl PoseSource for MyModel {
//!     fn estimate(&mut self, request: &PoseRequest) -> Result<Vec<KeypointSet>> {
//!         // Run inference on request.region at request.input_size,
//!         // keeping keypoints above request.min_confidence
//!         Ok(Vec::new())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "my-model"
//!     }
//! }
//! ```
//!
//! ## Counting heads
//!
//! ```no_run
//! use classroom_vote::{config::CountingConfig, counting::HeadCounter, scene::Scene};
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scene = Scene::from_file("scenes/amphi.yaml")?;
//! let mut counter = HeadCounter::new(CountingConfig::default());
//!
//! let result = counter.count(&scene.raw_detections()?, scene.frame()?);
//! println!("{} students", result.count);
//!
//! counter.export_predictions(File::create("amphi.txt")?)?;
//! # Ok(())
//! # }
//! ```

/// Planar geometry: points, boxes, crop regions and angles
pub mod geometry;

/// COCO pose keypoints and raw pose tensor decoding
pub mod keypoints;

/// Head detections and raw head tensor decoding
pub mod detection;

/// Per-arm validation producing hand candidates
pub mod hand_candidate;

/// Duplicate hand suppression
pub mod dedup;

/// Per-head vote aggregation
pub mod vote;

/// For/against survey reading of votes
pub mod survey;

/// Head counting with normalized export
pub mod counting;

/// End-to-end detection pipeline and the pose model seam
pub mod pipeline;

/// Normalized annotation files
pub mod annotation;

/// Append-only history log
pub mod history;

/// Evaluation against labelled images
pub mod evaluation;

/// Recorded scenes and replayed poses
pub mod scene;

/// Pixel-grid helpers
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
