// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::path::PathBuf;

use chrono::{DateTime, Local, SecondsFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    Completed,
    Failed,
    Skipped,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { analysis: String },
    Failed { error: String },
    /// Deliberately not sent to the model
    Skipped { reason: String },
}

/// What happened to one collected file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub file_path: PathBuf,
    /// ISO-8601, taken when the outcome was recorded
    pub timestamp: String,
    pub outcome: Outcome,
}

impl AnalysisResult {
    pub fn new(file_path: PathBuf, outcome: Outcome) -> Self {
        Self::at(file_path, Local::now(), outcome)
    }

    pub fn at(file_path: PathBuf, when: DateTime<Local>, outcome: Outcome) -> Self {
        Self {
            file_path,
            timestamp: when.to_rfc3339_opts(SecondsFormat::Secs, false),
            outcome,
        }
    }

    pub fn completed(file_path: PathBuf, analysis: impl Into<String>) -> Self {
        Self::new(
            file_path,
            Outcome::Completed {
                analysis: analysis.into(),
            },
        )
    }

    pub fn failed(file_path: PathBuf, error: impl Into<String>) -> Self {
        Self::new(
            file_path,
            Outcome::Failed {
                error: error.into(),
            },
        )
    }

    pub fn skipped(file_path: PathBuf, reason: impl Into<String>) -> Self {
        Self::new(
            file_path,
            Outcome::Skipped {
                reason: reason.into(),
            },
        )
    }

    pub fn status(&self) -> AnalysisStatus {
        match self.outcome {
            Outcome::Completed { .. } => AnalysisStatus::Completed,
            Outcome::Failed { .. } => AnalysisStatus::Failed,
            Outcome::Skipped { .. } => AnalysisStatus::Skipped,
        }
    }

    pub fn analysis_text(&self) -> Option<&str> {
        match self.outcome {
            Outcome::Completed { ref analysis } => Some(analysis),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.outcome {
            Outcome::Failed { ref error } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.status() {
                AnalysisStatus::Completed => acc.succeeded += 1,
                AnalysisStatus::Failed => acc.failed += 1,
                AnalysisStatus::Skipped => acc.skipped += 1,
            }
            acc
        })
    }
}
