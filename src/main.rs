//! Classroom vote command line: count, vote and survey on recorded scenes,
//! and evaluate against labelled datasets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use classroom_vote::annotation::{load_annotations, read_annotations, save_annotations, NormalizedBox};
use classroom_vote::config::{Config, EXAMPLE_CONFIG};
use classroom_vote::constants::SURVEY_HAND_CLASS_ID;
use classroom_vote::counting::HeadCounter;
use classroom_vote::dedup::AcceptedHand;
use classroom_vote::evaluation::{
    ground_truth_boxes, ground_truth_hands, match_boxes, match_hands, match_raised_hands, Metrics, SideMetrics,
};
use classroom_vote::history::HistoryLog;
use classroom_vote::pipeline::HandRaiseDetector;
use classroom_vote::scene::Scene;
use classroom_vote::survey::{SurveyAnswer, SurveyResult, SurveyTally};
use classroom_vote::vote::{HeadVote, VoteTally};
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// History file (overrides the configured path)
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count the students in a scene
    Count(RunArgs),

    /// Read the left/right vote of every student in a scene
    Vote(RunArgs),

    /// Read a for/against survey in a scene
    Survey(RunArgs),

    /// Evaluate a directory of scenes against label files
    Evaluate {
        /// Directory of scene files (.yaml, .yml, .json)
        scenes: PathBuf,

        /// Directory of label files named after the scenes (.txt)
        labels: PathBuf,

        /// What to evaluate
        #[arg(short, long, value_enum, default_value = "vote")]
        mode: Mode,
    },

    /// Write an example configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "classroom-vote.yaml")]
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Scene file with recorded detections and poses
    scene: PathBuf,

    /// Export predictions as normalized annotations
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Append the result to the history file
    #[arg(short, long)]
    record: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Count,
    Vote,
    Survey,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Failed to load config file: {}. Using defaults.", e);
                    Config::default()
                }
            }
        }
        None => Config::default(),
    };
    if let Some(path) = args.history {
        config.history.path = path;
    }

    match args.command {
        Command::Count(run) => count(&config, &run),
        Command::Vote(run) => vote(&config, &run),
        Command::Survey(run) => survey(&config, &run),
        Command::Evaluate { scenes, labels, mode } => evaluate(&config, &scenes, &labels, mode),
        Command::InitConfig { path } => {
            std::fs::write(&path, EXAMPLE_CONFIG).with_context(|| format!("writing {}", path.display()))?;
            println!("Example configuration written to {}", path.display());
            Ok(())
        }
    }
}

fn load_scene(path: &Path) -> Result<Scene> {
    Scene::from_file(path).with_context(|| format!("loading scene {}", path.display()))
}

fn accepted_hands(votes: &[HeadVote]) -> Vec<AcceptedHand> {
    votes.iter().flat_map(|v| v.hands.iter().copied()).collect()
}

fn count(config: &Config, run: &RunArgs) -> Result<()> {
    let scene = load_scene(&run.scene)?;
    let mut counter = HeadCounter::new(config.counting);
    let result = counter.count(&scene.raw_detections()?, scene.frame()?);

    println!("Il y a {} étudiants", result.count);

    if let Some(path) = &run.export {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        counter.export_predictions(std::io::BufWriter::new(file))?;
        info!("Predictions exported to {}", path.display());
    }
    if run.record {
        HistoryLog::new(&config.history.path).record_count(result.count)?;
    }
    Ok(())
}

fn detect(config: &Config, scene: &Scene) -> Result<Vec<HeadVote>> {
    let detector = HandRaiseDetector::new(config.clone())?;
    let mut poses = scene.recorded_poses()?;
    Ok(detector.detect(scene.frame()?, &scene.raw_detections()?, &mut poses))
}

/// Write the accepted hands; `class_id` replaces the per-side class when set
fn export_hands(path: &Path, votes: &[HeadVote], scene: &Scene, class_id: Option<u32>) -> Result<()> {
    let frame = scene.frame()?;
    let boxes: Vec<NormalizedBox> = accepted_hands(votes)
        .iter()
        .map(|hand| {
            let bbox = NormalizedBox::for_hand(hand, frame);
            class_id.map_or(bbox, |id| bbox.with_class(id))
        })
        .collect();
    save_annotations(path, &boxes)?;
    info!("{} hands exported to {}", boxes.len(), path.display());
    Ok(())
}

fn vote(config: &Config, run: &RunArgs) -> Result<()> {
    let scene = load_scene(&run.scene)?;
    let votes = detect(config, &scene)?;

    for head in &votes {
        println!("Head {:>3}: {}", head.head_id, head.vote);
    }
    let tally = VoteTally::from_votes(&votes);
    println!(
        "Option A: {} ({:.1}%) | Option B: {} ({:.1}%) | Abstention: {} ({:.1}%)",
        tally.left,
        tally.left_percent(),
        tally.right,
        tally.right_percent(),
        tally.abstain,
        tally.abstain_percent()
    );

    if let Some(path) = &run.export {
        export_hands(path, &votes, &scene, None)?;
    }
    if run.record {
        HistoryLog::new(&config.history.path).record_vote(&tally)?;
    }
    Ok(())
}

fn survey(config: &Config, run: &RunArgs) -> Result<()> {
    let scene = load_scene(&run.scene)?;
    let votes = detect(config, &scene)?;

    if let Some(path) = &run.export {
        export_hands(path, &votes, &scene, Some(SURVEY_HAND_CLASS_ID))?;
    }

    let results: Vec<SurveyResult> = votes.into_iter().map(SurveyResult::from).collect();
    let tally = SurveyTally::from_results(&results);
    for result in &results {
        let answer = match result.answer {
            SurveyAnswer::For => "pour",
            SurveyAnswer::Against => "contre",
        };
        println!("Head {:>3}: {}", result.head_id, answer);
    }
    println!("{:.1}% pour ({} pour et {} contre)", tally.pour_percent(), tally.pour, tally.contre);

    if run.record {
        HistoryLog::new(&config.history.path).record_survey(&tally)?;
    }
    Ok(())
}

/// Scene files of a directory with their label files, sorted by name
fn dataset_pairs(scenes: &Path, labels: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut scene_files: Vec<PathBuf> = std::fs::read_dir(scenes)
        .with_context(|| format!("reading {}", scenes.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "yaml" | "yml" | "json"))
        })
        .collect();
    scene_files.sort();

    let mut pairs = Vec::with_capacity(scene_files.len());
    for scene in scene_files {
        let Some(stem) = scene.file_stem() else { continue };
        let label = labels.join(format!("{}.txt", stem.to_string_lossy()));
        if label.exists() {
            pairs.push((scene, label));
        } else {
            warn!("No labels for {}, skipping", scene.display());
        }
    }
    Ok(pairs)
}

fn evaluate(config: &Config, scenes: &Path, labels: &Path, mode: Mode) -> Result<()> {
    let pairs = dataset_pairs(scenes, labels)?;
    info!("Evaluating {:?} on {} images", mode, pairs.len());

    let eval = config.evaluation;
    let detector = HandRaiseDetector::new(config.clone())?;
    let mut totals = SideMetrics::default();

    for (scene_path, label_path) in &pairs {
        let scene = load_scene(scene_path)?;
        let frame = scene.frame()?;
        let gt = load_annotations(label_path).with_context(|| format!("loading {}", label_path.display()))?;
        let name = scene_path.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned());

        let image = match mode {
            Mode::Count => {
                let mut counter = HeadCounter::new(config.counting);
                counter.count(&scene.raw_detections()?, frame);
                // Compare what was actually exported
                let mut exported = Vec::new();
                counter.export_predictions(&mut exported)?;
                let predicted: Vec<_> = read_annotations(exported.as_slice())?
                    .iter()
                    .map(|b| b.to_pixels(frame))
                    .collect();
                let truth = ground_truth_boxes(&gt, eval.gt_head_class_id, frame);
                let metrics = match_boxes(&truth, &predicted, f64::from(eval.iou_threshold));
                SideMetrics {
                    overall: metrics,
                    ..SideMetrics::default()
                }
            }
            Mode::Vote => {
                let mut poses = scene.recorded_poses()?;
                let votes = detector.detect(frame, &scene.raw_detections()?, &mut poses);
                let truth = ground_truth_hands(&gt, eval.gt_left_class_id, eval.gt_right_class_id, frame);
                match_hands(&truth, &accepted_hands(&votes), eval.matching_radius_ratio)
            }
            Mode::Survey => {
                let mut poses = scene.recorded_poses()?;
                let results = detector.detect_survey(frame, &scene.raw_detections()?, &mut poses);
                let predicted: Vec<AcceptedHand> = results.iter().flat_map(|r| r.hands.iter().copied()).collect();
                let truth: Vec<_> = ground_truth_hands(&gt, eval.gt_left_class_id, eval.gt_right_class_id, frame)
                    .into_iter()
                    .map(|hand| hand.position)
                    .collect();
                let metrics = match_raised_hands(&truth, &predicted, eval.matching_radius_ratio);
                SideMetrics {
                    overall: metrics,
                    ..SideMetrics::default()
                }
            }
        };

        let Metrics { tp, fp, fn_ } = image.overall;
        println!("{name:<24} | TP={tp:2} FP={fp:2} FN={fn_:2}");
        totals += image;
    }

    println!();
    println!("Images: {}", pairs.len());
    println!("Global: {}", totals.overall);
    if mode == Mode::Vote {
        println!("Left:   {}", totals.left);
        println!("Right:  {}", totals.right);
    }
    Ok(())
}
