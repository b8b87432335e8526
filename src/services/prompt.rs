// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{PromptSource, PromptSpec};
use crate::error::{Error, Result};

/// Looked up in the working directory when no prompt is configured
pub const DEFAULT_PROMPT_FILE: &str = "system_prompt.txt";

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a senior application security reviewer.

Review the file you are given and report:
1. Security vulnerabilities (injection, XSS, SSRF, prototype pollution, unsafe deserialization, path traversal, insecure crypto)
2. Hard-coded secrets: API keys, tokens, passwords, private keys, internal URLs
3. Risky patterns worth a second look (eval, dynamic require, disabled TLS checks)

For each finding give the line or snippet, the severity (LOW, MEDIUM, HIGH, CRITICAL) and a one-sentence fix.
If there is nothing to report, answer exactly: NO FINDINGS"#;

pub struct PromptResolver;

impl PromptResolver {
    /// Resolve relative to the working directory
    pub fn resolve(source: &PromptSource) -> Result<PromptSpec> {
        Self::resolve_in(source, Path::new("."))
    }

    /// `base` is where the default prompt file is looked up.
    pub fn resolve_in(source: &PromptSource, base: &Path) -> Result<PromptSpec> {
        match source {
            PromptSource::Literal(text) => Ok(PromptSpec::new(text.as_str())),
            PromptSource::File(path) => {
                let text = fs::read_to_string(path).map_err(|e| Error::PromptFile {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                debug!(path = %path.display(), chars = text.len(), "system prompt loaded");
                Ok(PromptSpec::new(text))
            }
            PromptSource::Auto(value) => {
                let path = Path::new(value);
                if path.is_file() {
                    match fs::read_to_string(path) {
                        Ok(text) => {
                            debug!(
                                path = %path.display(),
                                chars = text.len(),
                                "system prompt loaded"
                            );
                            return Ok(PromptSpec::new(text));
                        }
                        Err(e) => {
                            warn!(
                                path = %path.display(),
                                error = %e,
                                "unreadable prompt file, using the value itself as the prompt"
                            );
                            return Ok(PromptSpec::new(value.as_str()));
                        }
                    }
                }
                if looks_like_path(value) {
                    warn!(
                        value = %value,
                        "no file at this path, using the value itself as the system prompt"
                    );
                }
                Ok(PromptSpec::new(value.as_str()))
            }
            PromptSource::Default => {
                let path = base.join(DEFAULT_PROMPT_FILE);
                if path.is_file() {
                    return Self::resolve_in(&PromptSource::File(path), base);
                }
                debug!("using built-in system prompt");
                Ok(PromptSpec::new(DEFAULT_SYSTEM_PROMPT))
            }
        }
    }
}

/// A single token with a separator or an extension was probably meant as a file.
fn looks_like_path(value: &str) -> bool {
    if value.is_empty() || value.contains(char::is_whitespace) {
        return false;
    }
    value.contains('/') || value.contains('\\') || Path::new(value).extension().is_some()
}
