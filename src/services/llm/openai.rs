// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{
    InferenceClient, drain_lines, http_client, require_api_key, status_error, transport_error,
};
use crate::config::Config;
use crate::domain::InferenceRequest;
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: require_api_key(config)?,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl InferenceClient for OpenAiProvider {
    async fn submit(
        &self,
        request: &InferenceRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&ChatRequest {
                model: request.model,
                messages: vec![
                    Message {
                        role: "system",
                        content: request.system_prompt.text().to_string(),
                    },
                    Message {
                        role: "user",
                        content: request.to_user_message(),
                    },
                ],
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                stream: true,
            })
            .send()
            .await
            .map_err(|e| transport_error(self.name(), e))?;

        if !response.status().is_success() {
            return Err(status_error(self.name(), response).await);
        }

        let mut stream = response.bytes_stream();
        let mut full_response = String::new();
        let mut line_buffer: Vec<u8> = Vec::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled);
                }
                chunk = stream.next() => {
                    let Some(chunk) = chunk else { break };
                    let chunk = chunk.map_err(|e| transport_error(self.name(), e))?;

                    line_buffer.extend_from_slice(&chunk);

                    for line in drain_lines(&mut line_buffer) {
                        if absorb(&line, &mut full_response) {
                            return Ok(full_response.trim().to_string());
                        }
                    }
                }
            }
        }

        let tail = String::from_utf8_lossy(&line_buffer).trim().to_string();
        if !tail.is_empty() && absorb(&tail, &mut full_response) {
            return Ok(full_response.trim().to_string());
        }

        // Body closed before the terminating event
        Err(Error::Provider {
            provider: self.name().into(),
            message: "stream ended early".into(),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Feed one SSE line; returns true once the model has finished
fn absorb(line: &str, full_response: &mut String) -> bool {
    if line == "data: [DONE]" {
        return true;
    }
    let Some(data) = line.strip_prefix("data: ") else {
        return false;
    };
    let Ok(chunk) = serde_json::from_str::<ChatChunk>(data) else {
        return false;
    };

    for choice in &chunk.choices {
        if let Some(ref content) = choice.delta.content {
            full_response.push_str(content);
        }
        if choice.finish_reason.is_some() {
            return true;
        }
    }
    false
}
