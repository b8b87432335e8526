// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

//! Integration tests for the HTTP inference providers.
//!
//! Uses `wiremock` to mock HTTP endpoints so no real LLM servers are needed.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deepwalker::config::{Config, Provider};
use deepwalker::domain::{InferenceRequest, PromptSpec};
use deepwalker::error::Error;
use deepwalker::services::llm::anthropic::AnthropicProvider;
use deepwalker::services::llm::ollama::OllamaProvider;
use deepwalker::services::llm::openai::OpenAiProvider;
use deepwalker::services::llm::{InferenceClient, create_client};

// ─── Test helpers ────────────────────────────────────────────────────────────

fn ollama_config(server_url: &str) -> Config {
    Config {
        provider: Provider::Ollama,
        model: Some("qwen2.5-coder:7b".into()),
        ollama_host: server_url.to_string(),
        timeout_secs: 5,
        ..Config::default()
    }
}

fn openai_config(server_url: &str) -> Config {
    Config {
        provider: Provider::OpenAI,
        model: Some("gpt-4o-mini".into()),
        openai_base_url: Some(server_url.to_string()),
        api_key: Some("test-key".into()),
        timeout_secs: 5,
        ..Config::default()
    }
}

fn anthropic_config(server_url: &str) -> Config {
    Config {
        provider: Provider::Anthropic,
        model: Some("claude-test".into()),
        anthropic_base_url: Some(format!("{server_url}/v1")),
        api_key: Some("test-key".into()),
        timeout_secs: 5,
        ..Config::default()
    }
}

async fn submit(client: &dyn InferenceClient, model: &str) -> deepwalker::Result<String> {
    let prompt = PromptSpec::new("Review");
    let request = InferenceRequest {
        system_prompt: &prompt,
        file_path: Path::new("src/test.js"),
        content: "console.log(11)",
        model,
    };
    client.submit(&request, CancellationToken::new()).await
}

fn provider_message(err: Error, expected_provider: &str) -> String {
    match err {
        Error::Provider { provider, message } => {
            assert_eq!(provider, expected_provider);
            message
        }
        other => panic!("expected Provider error, got: {other:?}"),
    }
}

/// One-shot HTTP server that sends `body` as two chunked-encoding frames,
/// cut at byte `split`, with a pause in between.
async fn serve_split_body(body: &'static str, split: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        // Drain the request (headers plus content-length body)
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + body_len {
                    break;
                }
            }
        }

        socket
            .write_all(b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n")
            .await
            .unwrap();
        for part in [&body.as_bytes()[..split], &body.as_bytes()[split..]] {
            socket
                .write_all(format!("{:x}\r\n", part.len()).as_bytes())
                .await
                .unwrap();
            socket.write_all(part).await.unwrap();
            socket.write_all(b"\r\n").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        socket.write_all(b"0\r\n\r\n").await.unwrap();
        socket.flush().await.unwrap();
    });

    format!("http://{addr}")
}

/// Offset just past the lead byte of the first two-byte character
fn inside_first_multibyte(body: &str) -> usize {
    body.bytes().position(|b| b == 0xC3).unwrap() + 1
}

// ─── Anthropic ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn anthropic_streaming_response() {
    let server = MockServer::start().await;

    // Anthropic SSE format: "event:" line followed by "data:" line
    let body = [
        "event: content_block_delta",
        r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":"NO "}}"#,
        "",
        "event: content_block_delta",
        r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":"FINDINGS"}}"#,
        "",
        "event: message_stop",
        r#"data: {"type":"message_stop"}"#,
        "",
    ]
    .join("\n");

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-test",
            "system": "Review",
            "max_tokens": 8192,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(&anthropic_config(&server.uri())).unwrap();
    let result = submit(&provider, "claude-test").await.unwrap();

    assert_eq!(result, "NO FINDINGS");
}

#[tokio::test]
async fn anthropic_stream_error_event() {
    let server = MockServer::start().await;

    let body = [
        "event: error",
        r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        "",
    ]
    .join("\n");

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(&anthropic_config(&server.uri())).unwrap();
    let err = submit(&provider, "claude-test").await.unwrap_err();

    assert_eq!(provider_message(err, "anthropic"), "Overloaded");
}

#[tokio::test]
async fn anthropic_character_split_across_chunks() {
    let body = concat!(
        "event: content_block_delta\n",
        r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":"café"}}"#,
        "\n\nevent: message_stop\n",
        r#"data: {"type":"message_stop"}"#,
        "\n\n",
    );
    let url = serve_split_body(body, inside_first_multibyte(body)).await;

    let provider = AnthropicProvider::new(&anthropic_config(&url)).unwrap();
    let result = submit(&provider, "claude-test").await.unwrap();

    assert_eq!(result, "café");
}

#[tokio::test]
async fn anthropic_stream_without_message_stop() {
    let server = MockServer::start().await;

    let body = [
        "event: content_block_delta",
        r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":"Line 1: "}}"#,
        "",
    ]
    .join("\n");

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(&anthropic_config(&server.uri())).unwrap();
    let err = submit(&provider, "claude-test").await.unwrap_err();

    assert_eq!(provider_message(err, "anthropic"), "stream ended early");
}

#[tokio::test]
async fn anthropic_rejected_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(&anthropic_config(&server.uri())).unwrap();
    let err = submit(&provider, "claude-test").await.unwrap_err();

    let message = provider_message(err, "anthropic");
    assert!(
        message.contains("authentication rejected"),
        "got: {message}"
    );
}

#[test]
fn anthropic_requires_key() {
    let config = Config {
        provider: Provider::Anthropic,
        api_key: None,
        ..Config::default()
    };

    let err = AnthropicProvider::new(&config).err().expect("no key, no client");
    assert!(matches!(err, Error::MissingApiKey { .. }));
    assert!(err.is_configuration());
}

// ─── OpenAI ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn openai_streaming_response() {
    let server = MockServer::start().await;

    let body = [
        r#"data: {"choices":[{"delta":{"content":"Line 3: "},"finish_reason":null}]}"#,
        "",
        r#"data: {"choices":[{"delta":{"content":"eval() on user input"},"finish_reason":"stop"}]}"#,
        "",
        "data: [DONE]",
        "",
    ]
    .join("\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({ "model": "gpt-4o-mini" })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&openai_config(&server.uri())).unwrap();
    let result = submit(&provider, "gpt-4o-mini").await.unwrap();

    assert_eq!(result, "Line 3: eval() on user input");
}

#[tokio::test]
async fn openai_done_without_trailing_newline() {
    let server = MockServer::start().await;

    let body = [
        r#"data: {"choices":[{"delta":{"content":"NO FINDINGS"},"finish_reason":null}]}"#,
        "",
        "data: [DONE]",
    ]
    .join("\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&openai_config(&server.uri())).unwrap();
    let result = submit(&provider, "gpt-4o-mini").await.unwrap();

    assert_eq!(result, "NO FINDINGS");
}

#[tokio::test]
async fn openai_stream_cut_before_done() {
    let server = MockServer::start().await;

    let body = [
        r#"data: {"choices":[{"delta":{"content":"Line 3: "},"finish_reason":null}]}"#,
        "",
    ]
    .join("\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&openai_config(&server.uri())).unwrap();
    let err = submit(&provider, "gpt-4o-mini").await.unwrap_err();

    assert_eq!(provider_message(err, "openai"), "stream ended early");
}

#[tokio::test]
async fn openai_payload_too_large() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(413).set_body_string("context length exceeded"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&openai_config(&server.uri())).unwrap();
    let err = submit(&provider, "gpt-4o-mini").await.unwrap_err();

    let message = provider_message(err, "openai");
    assert!(message.contains("too large"), "got: {message}");
    assert!(message.contains("413"), "got: {message}");
}

#[tokio::test]
async fn openai_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = Config {
        timeout_secs: 1,
        ..openai_config(&server.uri())
    };
    let provider = OpenAiProvider::new(&config).unwrap();
    let err = submit(&provider, "gpt-4o-mini").await.unwrap_err();

    assert_eq!(provider_message(err, "openai"), "request timed out");
}

// ─── Ollama ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ollama_streaming_response() {
    let server = MockServer::start().await;

    // NDJSON streaming: each line is a separate JSON object
    let body = [
        r#"{"response":"NO","done":false}"#,
        r#"{"response":" FINDINGS","done":true}"#,
    ]
    .join("\n");

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "qwen2.5-coder:7b",
            "system": "Review",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ollama_config(&server.uri())).unwrap();
    let result = submit(&provider, "qwen2.5-coder:7b").await.unwrap();

    assert_eq!(result, "NO FINDINGS");
}

#[tokio::test]
async fn ollama_last_line_without_newline() {
    let server = MockServer::start().await;

    let body = r#"{"response":"partial","done":false}
{"response":" tail","done":false}"#;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ollama_config(&server.uri())).unwrap();
    let result = submit(&provider, "qwen2.5-coder:7b").await.unwrap();

    assert_eq!(result, "partial tail");
}

#[tokio::test]
async fn ollama_character_split_across_chunks() {
    let body = "{\"response\":\"café\",\"done\":true}\n";
    let url = serve_split_body(body, inside_first_multibyte(body)).await;

    let provider = OllamaProvider::new(&ollama_config(&url)).unwrap();
    let result = submit(&provider, "qwen2.5-coder:7b").await.unwrap();

    assert_eq!(result, "café");
}

#[tokio::test]
async fn ollama_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ollama_config(&server.uri())).unwrap();
    let err = submit(&provider, "qwen2.5-coder:7b").await.unwrap_err();

    let message = provider_message(err, "ollama");
    assert!(message.contains("500"), "got: {message}");
}

#[tokio::test]
async fn ollama_connection_refused() {
    // Use a port that is almost certainly not listening
    let provider = OllamaProvider::new(&ollama_config("http://127.0.0.1:1")).unwrap();
    let err = submit(&provider, "qwen2.5-coder:7b").await.unwrap_err();

    assert!(matches!(err, Error::Provider { .. }), "got: {err:?}");
}

// ─── Factory ─────────────────────────────────────────────────────────────────

#[test]
fn factory_picks_provider() {
    let client = create_client(&ollama_config("http://localhost:11434")).unwrap();
    assert_eq!(client.name(), "ollama");

    let client = create_client(&openai_config("http://localhost:1")).unwrap();
    assert_eq!(client.name(), "openai");
}

#[test]
fn factory_refuses_cloud_provider_without_key() {
    let config = Config {
        provider: Provider::OpenAI,
        ..Config::default()
    };
    assert!(matches!(
        create_client(&config),
        Err(Error::MissingApiKey { .. })
    ));
}
