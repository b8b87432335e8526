// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

/// Where the system prompt comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// A file path if one exists at this location, otherwise the literal text
    Auto(String),
    /// Must be a readable file
    File(PathBuf),
    /// Used verbatim
    Literal(String),
    /// `system_prompt.txt` in the working directory, else the built-in prompt
    Default,
}

/// The resolved system prompt, shared read-only by every request of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    resolved_text: String,
}

impl PromptSpec {
    pub fn new(resolved_text: impl Into<String>) -> Self {
        Self {
            resolved_text: resolved_text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.resolved_text
    }
}

/// One file submission to the inference service
#[derive(Debug)]
pub struct InferenceRequest<'a> {
    pub system_prompt: &'a PromptSpec,
    pub file_path: &'a Path,
    pub content: &'a str,
    pub model: &'a str,
}

impl InferenceRequest<'_> {
    /// User message: the file content, labelled with its path
    pub fn to_user_message(&self) -> String {
        format!(
            "Analyze the following file ({path}) for security vulnerabilities, exposed secrets, and potential issues:\n\n{content}",
            path = self.file_path.display(),
            content = self.content,
        )
    }
}
