// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    InferenceClient, drain_lines, http_client, require_api_key, status_error, transport_error,
};
use crate::config::Config;
use crate::domain::InferenceRequest;
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
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
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<ContentDelta>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ContentDelta {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl AnthropicProvider {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config
                .anthropic_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: require_api_key(config)?,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Feed one SSE line; returns true on `message_stop`
    fn absorb(&self, line: &str, full_response: &mut String) -> Result<bool> {
        // SSE format: "event: <type>" followed by "data: <json>"
        let Some(data) = line.strip_prefix("data: ") else {
            return Ok(false);
        };
        let Ok(event) = serde_json::from_str::<StreamEvent>(data) else {
            return Ok(false);
        };

        match event.event_type.as_str() {
            "content_block_delta" => {
                if let Some(text) = event.delta.and_then(|d| d.text) {
                    full_response.push_str(&text);
                }
                Ok(false)
            }
            "message_stop" => Ok(true),
            "error" => Err(Error::Provider {
                provider: self.name().into(),
                message: event
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "stream error".into()),
            }),
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl InferenceClient for AnthropicProvider {
    async fn submit(
        &self,
        request: &InferenceRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model: request.model,
                system: request.system_prompt.text(),
                messages: vec![Message {
                    role: "user",
                    content: request.to_user_message(),
                }],
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
                        if self.absorb(&line, &mut full_response)? {
                            debug!(chars = full_response.len(), "anthropic stream finished");
                            return Ok(full_response.trim().to_string());
                        }
                    }
                }
            }
        }

        // Terminating event may arrive without a trailing newline
        let tail = String::from_utf8_lossy(&line_buffer).trim().to_string();
        if !tail.is_empty() && self.absorb(&tail, &mut full_response)? {
            return Ok(full_response.trim().to_string());
        }

        // Body closed before the terminating event
        Err(Error::Provider {
            provider: self.name().into(),
            message: "stream ended early".into(),
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
