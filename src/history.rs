//! Append-only history of counts, surveys and votes.

use crate::constants::HISTORY_DATE_FORMAT;
use crate::survey::SurveyTally;
use crate::vote::VoteTally;
use crate::{Error, Result};
use chrono::{Local, NaiveDateTime};
use log::info;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Format a count entry
#[must_use]
pub fn format_count_line(at: NaiveDateTime, count: usize) -> String {
    format!("[C]: {}, Il y a {} étudiants", at.format(HISTORY_DATE_FORMAT), count)
}

/// Format a survey entry
#[must_use]
pub fn format_survey_line(at: NaiveDateTime, tally: &SurveyTally) -> String {
    format!(
        "[S]: {}, {:.1}% des étudiants sont pour ({} pour et {} contre)",
        at.format(HISTORY_DATE_FORMAT),
        tally.pour_percent(),
        tally.pour,
        tally.contre
    )
}

/// Format a vote entry.
///
/// The leading space is part of the established file format.
#[must_use]
pub fn format_vote_line(at: NaiveDateTime, tally: &VoteTally) -> String {
    format!(
        " [V]: {}, {:.1}% option A, {:.1}% option B et {:.1}% abstention ({} votes au total)",
        at.format(HISTORY_DATE_FORMAT),
        tally.left_percent(),
        tally.right_percent(),
        tally.abstain_percent(),
        tally.total()
    )
}

/// History file writer.
///
/// Appends are serialized, so one log can be shared between threads.
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl HistoryLog {
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a head count with the current local time
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written
    pub fn record_count(&self, count: usize) -> Result<()> {
        self.append(&format_count_line(now(), count))
    }

    /// Record a survey tally with the current local time
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written
    pub fn record_survey(&self, tally: &SurveyTally) -> Result<()> {
        self.append(&format_survey_line(now(), tally))
    }

    /// Record a vote tally with the current local time
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written
    pub fn record_vote(&self, tally: &VoteTally) -> Result<()> {
        self.append(&format_vote_line(now(), tally))
    }

    fn append(&self, line: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::InvalidState("History log lock poisoned".to_string()))?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;

        info!("History updated: {}", self.path.display());
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
