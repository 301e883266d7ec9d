use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a single probe.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Found,
    NotFound,
    Error,
    /// The probe completed but its status could not be read.
    Unobservable,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Found => "found",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
            Outcome::Unobservable => "unobservable",
        };
        f.pad(s)
    }
}

/// One probed candidate path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub path: String,
    pub url: String,
    pub outcome: Outcome,
    /// HTTP status code, error detail, or `unobservable`.
    pub status: String,
    pub timestamp: String,
}

/// Running outcome tally for the current scan.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub found: u64,
    pub not_found: u64,
    pub errors: u64,
    pub unobservable: u64,
}

impl ScanStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Found => self.found += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Error => self.errors += 1,
            Outcome::Unobservable => self.unobservable += 1,
        }
    }

    /// Number of results counted so far.
    pub fn total(&self) -> u64 {
        self.found + self.not_found + self.errors + self.unobservable
    }
}

/// Lifecycle of the scan controller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl ScanState {
    /// Running or paused.
    pub fn is_active(self) -> bool {
        matches!(self, ScanState::Running | ScanState::Paused)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanState::Idle => "idle",
            ScanState::Running => "running",
            ScanState::Paused => "paused",
            ScanState::Completed => "completed",
            ScanState::Stopped => "stopped",
        };
        f.pad(s)
    }
}

/// Aggregate results and progress counters.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanSnapshot {
    pub state: ScanState,
    pub target: Option<String>,
    pub total: u64,
    pub completed: u64,
    pub progress: f64,
    pub stats: ScanStats,
    pub results: Vec<ProbeResult>,
}

/// Fraction of candidates probed; an empty wordlist counts as done.
pub fn progress_fraction(completed: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    }
}
