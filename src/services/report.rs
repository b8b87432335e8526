// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use console::style;

use crate::domain::{AnalysisResult, Outcome, RunSummary};
use crate::error::Result;

const HEAVY_RULE: &str =
    "================================================================================";
const LIGHT_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Results in arrival order plus the moment the report was started.
///
/// Rendering only reads this state, so rendering twice gives identical text.
#[derive(Debug, Clone)]
pub struct Report {
    generated_at: DateTime<Local>,
    model: String,
    results: Vec<AnalysisResult>,
}

impl Report {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_timestamp(model, Local::now())
    }

    pub fn with_timestamp(model: impl Into<String>, generated_at: DateTime<Local>) -> Self {
        Self {
            generated_at,
            model: model.into(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: AnalysisResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the rendered report to `path`, or stdout for "-"
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let rendered = self.render();
        if path == Path::new("-") {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            return Ok(());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, rendered)?;
        Ok(())
    }

    /// Colored summary box for the terminal
    pub fn summary_box(&self) -> String {
        let s = self.summary();
        let failed = if s.failed > 0 {
            style(s.failed).red().bold()
        } else {
            style(s.failed).green()
        };
        let bar = "═".repeat(44);

        format!(
            "{top}\n{title}\n{mid}\n  Total files processed:  {total}\n  Successfully analyzed:  {ok}\n  Failed analyses:        {failed}\n  Skipped files:          {skipped}\n{bottom}",
            top = style(format!("╔{bar}╗")).cyan(),
            title = style("  ANALYSIS SUMMARY").yellow().bold(),
            mid = style(format!("╠{bar}╣")).cyan(),
            total = style(s.total).green(),
            ok = style(s.succeeded).green(),
            skipped = style(s.skipped).yellow(),
            bottom = style(format!("╚{bar}╝")).cyan(),
        )
    }
}

/// Footer block shared by the report and its tests
pub fn render_summary(summary: &RunSummary) -> String {
    format!(
        "=== SUMMARY ===\nTotal files processed: {}\nSuccessfully analyzed: {}\nFailed analyses: {}\nSkipped files: {}\n",
        summary.total, summary.succeeded, summary.failed, summary.skipped
    )
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SECURITY ANALYSIS REPORT ===")?;
        writeln!(
            f,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "Model: {}", self.model)?;
        writeln!(f)?;

        for (i, result) in self.results.iter().enumerate() {
            writeln!(f, "FILE #{}: {}", i + 1, result.file_path.display())?;
            writeln!(f, "{HEAVY_RULE}")?;
            writeln!(f, "Status: {}", result.status())?;
            writeln!(f, "Analyzed: {}", result.timestamp)?;
            writeln!(f)?;

            match result.outcome {
                Outcome::Completed { ref analysis } => {
                    writeln!(f, "ANALYSIS:")?;
                    writeln!(f, "{LIGHT_RULE}")?;
                    writeln!(f, "{analysis}")?;
                }
                Outcome::Failed { ref error } => writeln!(f, "ERROR: {error}")?,
                Outcome::Skipped { ref reason } => writeln!(f, "NOTE: {reason}")?,
            }

            write!(f, "\n\n{HEAVY_RULE}\n\n")?;
        }

        f.write_str(&render_summary(&self.summary()))
    }
}
