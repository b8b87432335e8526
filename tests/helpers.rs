// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use deepwalker::domain::{InferenceRequest, PromptSource};
use deepwalker::error::{Error, Result};
use deepwalker::services::llm::InferenceClient;
use deepwalker::services::orchestrator::RunSettings;

/// Replies with a fixed text, failing for the listed file names
#[allow(dead_code)]
pub struct StubClient {
    reply: String,
    fail_on: Vec<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(PathBuf, String, String)>>,
}

#[allow(dead_code)]
impl StubClient {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_on: Vec::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.fail_on.push(file_name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (path, system prompt, content) per call
    pub fn seen(&self) -> Vec<(PathBuf, String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for StubClient {
    async fn submit(
        &self,
        request: &InferenceRequest<'_>,
        _cancel: CancellationToken,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((
            request.file_path.to_path_buf(),
            request.system_prompt.text().to_string(),
            request.content.to_string(),
        ));

        let name = request
            .file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if self.fail_on.iter().any(|f| f == name) {
            return Err(Error::Provider {
                provider: "stub".into(),
                message: "simulated transport error".into(),
            });
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Cancels the run from inside the first call, like Ctrl+C mid-request
#[allow(dead_code)]
pub struct CancellingClient {
    pub token: CancellationToken,
}

#[async_trait]
impl InferenceClient for CancellingClient {
    async fn submit(
        &self,
        _request: &InferenceRequest<'_>,
        _cancel: CancellationToken,
    ) -> Result<String> {
        self.token.cancel();
        Err(Error::Cancelled)
    }

    fn name(&self) -> &str {
        "cancelling"
    }
}

/// Write `files` (relative path, content) under `root`, creating parents
#[allow(dead_code)]
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

/// Settings for a `js`-only run with a literal prompt
#[allow(dead_code)]
pub fn js_settings(root: &Path) -> RunSettings {
    RunSettings {
        root: root.to_path_buf(),
        extensions: vec!["js".into()],
        recursive: true,
        exclude: Vec::new(),
        prompt: PromptSource::Literal("Review this file.".into()),
        label: "stub/test-model".into(),
        model: "test-model".into(),
        max_file_bytes: 1024 * 1024,
        skip_secrets: false,
    }
}

/// Relative paths, `/`-separated, for order assertions
#[allow(dead_code)]
pub fn relative(root: &Path, paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}
