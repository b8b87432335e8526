use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{InferenceClient, drain_lines, http_client, status_error, transport_error};
use crate::config::Config;
use crate::domain::InferenceRequest;
use crate::error::{Error, Result};

/// Local Ollama server; no credential
pub struct OllamaProvider {
    client: Client,
    host: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

impl OllamaProvider {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            // Sanitize: remove trailing slashes to avoid //api/generate
            host: config.ollama_host.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Returns true when the response is complete
    fn absorb(&self, line: &str, full_response: &mut String) -> Result<bool> {
        let Ok(resp) = serde_json::from_str::<GenerateResponse>(line) else {
            return Ok(false);
        };
        if let Some(message) = resp.error {
            return Err(Error::Provider {
                provider: self.name().into(),
                message,
            });
        }
        full_response.push_str(&resp.response);
        Ok(resp.done)
    }
}

#[async_trait]
impl InferenceClient for OllamaProvider {
    async fn submit(
        &self,
        request: &InferenceRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.host);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: request.model,
                system: request.system_prompt.text(),
                prompt: request.to_user_message(),
                stream: true,
                options: GenerateOptions {
                    temperature: self.temperature,
                    num_predict: self.max_tokens,
                },
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
                    let Some(chunk) = chunk else {
                        break; // Stream ended
                    };
                    let chunk = chunk.map_err(|e| transport_error(self.name(), e))?;

                    line_buffer.extend_from_slice(&chunk);

                    // Newline-delimited JSON
                    for line in drain_lines(&mut line_buffer) {
                        if self.absorb(&line, &mut full_response)? {
                            return Ok(full_response.trim().to_string());
                        }
                    }
                }
            }
        }

        // Last object may arrive without a trailing newline
        let tail = String::from_utf8_lossy(&line_buffer).trim().to_string();
        if !tail.is_empty() {
            self.absorb(&tail, &mut full_response)?;
        }

        Ok(full_response.trim().to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
