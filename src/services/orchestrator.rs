// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::path::PathBuf;

use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{AnalysisResult, FileTask, InferenceRequest, PromptSource, PromptSpec};
use crate::error::{Error, Result};
use crate::services::collector::FileCollector;
use crate::services::llm::InferenceClient;
use crate::services::prompt::PromptResolver;
use crate::services::report::Report;
use crate::services::safety;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Collecting,
    ResolvingPrompt,
    Processing,
    Reporting,
    Done,
    /// Configuration-level abort before any file was analyzed
    FailedFatal,
}

/// Everything one run needs besides the transport
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub recursive: bool,
    pub exclude: Vec<String>,
    pub prompt: PromptSource,
    /// `provider/model`, shown in the report header
    pub label: String,
    pub model: String,
    pub max_file_bytes: u64,
    pub skip_secrets: bool,
}

impl RunSettings {
    pub fn from_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root: root.into(),
            extensions: config.extensions.clone(),
            recursive: config.recursive,
            exclude: config.exclude.clone(),
            prompt: config.prompt_source(),
            label: format!("{}/{}", config.provider, config.model()),
            model: config.model().to_string(),
            max_file_bytes: config.max_file_bytes,
            skip_secrets: config.skip_secrets,
        }
    }
}

/// Drives one run: collect, resolve the prompt, analyze each file in order.
pub struct Orchestrator<'a> {
    client: &'a dyn InferenceClient,
    settings: RunSettings,
    cancel: CancellationToken,
    progress: ProgressBar,
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(client: &'a dyn InferenceClient, settings: RunSettings) -> Self {
        Self {
            client,
            settings,
            cancel: CancellationToken::new(),
            progress: ProgressBar::hidden(),
            state: RunState::Init,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Per-file problems end up in the report; only configuration errors return `Err`.
    pub async fn run(&mut self) -> Result<Report> {
        self.transition(RunState::Collecting);
        let tasks = match self.collect() {
            Ok(tasks) => tasks,
            Err(e) => return Err(self.abort(e)),
        };
        if tasks.is_empty() {
            warn!(root = %self.settings.root.display(), "no matching files found");
        } else {
            info!(count = tasks.len(), "files collected");
        }

        self.transition(RunState::ResolvingPrompt);
        let prompt = match PromptResolver::resolve(&self.settings.prompt) {
            Ok(prompt) => prompt,
            Err(e) => return Err(self.abort(e)),
        };

        self.transition(RunState::Processing);
        let mut report = Report::new(self.settings.label.as_str());
        self.progress.set_length(tasks.len() as u64);

        for (i, task) in tasks.iter().enumerate() {
            self.progress.set_message(task.path.display().to_string());
            debug!(index = i + 1, total = tasks.len(), path = %task.path.display(), "processing");

            let result = if self.cancel.is_cancelled() {
                AnalysisResult::skipped(task.path.clone(), "run cancelled")
            } else {
                self.analyze(task, &prompt).await
            };
            report.push(result);
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        self.transition(RunState::Reporting);
        let summary = report.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "run finished"
        );

        self.transition(RunState::Done);
        Ok(report)
    }

    fn collect(&self) -> Result<Vec<FileTask>> {
        let collector =
            FileCollector::new(&self.settings.root, self.settings.extensions.iter().cloned())
                .recursive(self.settings.recursive)
                .exclude(&self.settings.exclude)?;
        Ok(collector.walk()?.collect())
    }

    /// One file, one result. Never fails.
    async fn analyze(&self, task: &FileTask, prompt: &PromptSpec) -> AnalysisResult {
        let path = task.path.clone();

        match tokio::fs::metadata(&task.path).await {
            Ok(meta) if meta.len() > self.settings.max_file_bytes => {
                return AnalysisResult::skipped(
                    path,
                    format!(
                        "file is {} bytes, limit is {}",
                        meta.len(),
                        self.settings.max_file_bytes
                    ),
                );
            }
            Ok(_) => {}
            Err(e) => return AnalysisResult::failed(path, e.to_string()),
        }

        let bytes = match tokio::fs::read(&task.path).await {
            Ok(bytes) => bytes,
            Err(e) => return AnalysisResult::failed(path, e.to_string()),
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => return AnalysisResult::failed(path, format!("not valid UTF-8: {e}")),
        };

        if content.trim().is_empty() {
            warn!(path = %task.path.display(), "file is empty");
            return AnalysisResult::skipped(path, "empty file");
        }

        if self.settings.skip_secrets {
            let secrets = safety::scan_content(&content);
            if !secrets.is_empty() {
                warn!(
                    path = %task.path.display(),
                    count = secrets.len(),
                    "potential secrets detected, not sending"
                );
                return AnalysisResult::skipped(
                    path,
                    format!("potential secrets detected: {}", safety::describe(&secrets)),
                );
            }
        }

        let request = InferenceRequest {
            system_prompt: prompt,
            file_path: &task.path,
            content: &content,
            model: &self.settings.model,
        };

        match self.client.submit(&request, self.cancel.clone()).await {
            Ok(analysis) => {
                debug!(path = %task.path.display(), chars = analysis.len(), "analysis received");
                AnalysisResult::completed(path, analysis)
            }
            Err(Error::Cancelled) => AnalysisResult::skipped(path, "run cancelled"),
            Err(e) => {
                warn!(
                    path = %task.path.display(),
                    provider = self.client.name(),
                    error = %e,
                    "analysis failed"
                );
                AnalysisResult::failed(path, e.to_string())
            }
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    fn abort(&mut self, e: Error) -> Error {
        self.transition(RunState::FailedFatal);
        e
    }
}
