// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

// miette's Diagnostic derive generates code that triggers this false positive
#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Directory not found: {}", path.display())]
    #[diagnostic(
        code(deepwalker::collect::no_directory),
        help("Pass an existing directory as the first argument")
    )]
    DirectoryNotFound { path: PathBuf },

    #[error("Cannot read system prompt file {}: {message}", path.display())]
    #[diagnostic(
        code(deepwalker::prompt::file),
        help("Check the path given to --system-prompt-file, or pass the text with --system-prompt")
    )]
    PromptFile { path: PathBuf, message: String },

    #[error("Missing API key for {provider}")]
    #[diagnostic(
        code(deepwalker::config::api_key),
        help("Set DEEPWALKER_API_KEY or {env_var}")
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Invalid exclude pattern '{pattern}': {message}")]
    #[diagnostic(code(deepwalker::collect::exclude))]
    InvalidPattern { pattern: String, message: String },

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Provider '{provider}' error: {message}")]
    #[diagnostic(code(deepwalker::provider::error))]
    Provider { provider: String, message: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(deepwalker::config::error))]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Errors that abort the run before any file is analyzed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound { .. }
                | Self::PromptFile { .. }
                | Self::MissingApiKey { .. }
                | Self::InvalidPattern { .. }
                | Self::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
