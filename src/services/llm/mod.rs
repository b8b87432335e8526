// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tokio_util::sync::CancellationToken;

pub mod anthropic;
pub mod ollama;
pub mod openai;

use crate::config::{Config, Provider};
use crate::domain::InferenceRequest;
use crate::error::{Error, Result};

/// Transport to a hosted model. One call per file, never retried.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Submit one file and return the model's text verbatim (outer whitespace trimmed)
    async fn submit(
        &self,
        request: &InferenceRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<String>;

    fn name(&self) -> &str;
}

pub fn create_client(config: &Config) -> Result<Box<dyn InferenceClient>> {
    match config.provider {
        Provider::Anthropic => Ok(Box::new(anthropic::AnthropicProvider::new(config)?)),
        Provider::OpenAI => Ok(Box::new(openai::OpenAiProvider::new(config)?)),
        Provider::Ollama => Ok(Box::new(ollama::OllamaProvider::new(config)?)),
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// The key is read once at startup and handed to the constructor.
pub(crate) fn require_api_key(config: &Config) -> Result<secrecy::SecretString> {
    match config.api_key {
        Some(ref key) if !key.trim().is_empty() => Ok(key.clone().into()),
        _ => Err(Error::MissingApiKey {
            provider: config.provider.to_string(),
            env_var: config
                .provider
                .api_key_env()
                .unwrap_or("DEEPWALKER_API_KEY")
                .into(),
        }),
    }
}

pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    Error::Provider {
        provider: provider.into(),
        message,
    }
}

/// Map a non-success response to a readable failure
pub(crate) async fn status_error(provider: &str, response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("authentication rejected (HTTP {status}): {body}")
        }
        StatusCode::PAYLOAD_TOO_LARGE => {
            format!("file too large for the provider (HTTP {status}): {body}")
        }
        _ => format!("HTTP {status}: {body}"),
    };
    Error::Provider {
        provider: provider.into(),
        message,
    }
}

/// Pop complete lines off a byte buffer fed by `bytes_stream()`.
/// Chunks are NOT aligned to newlines or to UTF-8 boundaries; the tail stays
/// buffered as raw bytes until its newline arrives.
pub(crate) fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}
