//! OpenAI-compatible chat completions transport
//!
//! Sends a non-streaming request to `{base_url}/chat/completions`:
//! ```text
//! {"model":"llama-3.1-8b-instant","messages":[...],"max_tokens":100,"temperature":0.1}
//! ```
//! and reads `choices[0].message.content` plus `usage.total_tokens`.

use super::{ChatCompletion, ChatRequest, ChatTransport};
use crate::config::RemoteConfig;
use crate::types::ChatMessage;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// HTTP transport for any OpenAI-compatible endpoint (Groq, OpenAI, vLLM)
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiTransport {
    /// Create a transport from remote configuration
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            timeout: config.timeout(),
        })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        let api_key = self.api_key.as_deref().ok_or(Error::RemoteUnavailable)?;

        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::RemoteTimeout(self.timeout)
                } else {
                    Error::transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!("HTTP {}: {}", status, body)));
        }

        let reply: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("Malformed completion body: {}", e)))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::parse("Completion has no message content"))?;

        let total_tokens = reply.usage.map_or(0, |usage| usage.total_tokens);
        debug!("Completion received: {} tokens", total_tokens);

        Ok(ChatCompletion::new(content.trim(), total_tokens))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// =============================================================================
// Wire structures
// =============================================================================

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> RemoteConfig {
        RemoteConfig::default()
            .with_base_url(server.uri())
            .with_api_key("gsk_test")
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 8, "total_tokens": 48}
        })
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("gsk_test"))
            .and(body_partial_json(serde_json::json!({"model": "llama-3.1-8b-instant"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  SAFE: greeting  ")))
            .expect(1)
            .mount(&server)
            .await;

        let transport = OpenAiTransport::new(&config(&server)).unwrap();
        let reply = transport
            .complete(&ChatRequest::new("system", "hello"))
            .await
            .unwrap();

        assert_eq!(reply.content, "SAFE: greeting");
        assert_eq!(reply.total_tokens, 48);
    }

    #[tokio::test]
    async fn test_missing_usage_defaults_to_zero() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "TOXIC: insult"}}]
            })))
            .mount(&server)
            .await;

        let transport = OpenAiTransport::new(&config(&server)).unwrap();
        let reply = transport
            .complete(&ChatRequest::new("system", "you idiot"))
            .await
            .unwrap();

        assert_eq!(reply.total_tokens, 0);
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let transport = OpenAiTransport::new(&config(&server)).unwrap();
        let err = transport
            .complete(&ChatRequest::new("system", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RemoteTransport(ref msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let transport = OpenAiTransport::new(&config(&server)).unwrap();
        let err = transport
            .complete(&ChatRequest::new("system", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RemoteParse(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("SAFE: late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config(&server);
        config.timeout_secs = 1;

        let transport = OpenAiTransport::new(&config).unwrap();
        let err = transport
            .complete(&ChatRequest::new("system", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RemoteTimeout(_)));
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let transport = OpenAiTransport::new(&RemoteConfig::default()).unwrap();
        let err = transport
            .complete(&ChatRequest::new("system", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RemoteUnavailable));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = RemoteConfig::default().with_base_url("http://localhost:8000/v1/");
        let transport = OpenAiTransport::new(&config).unwrap();

        assert_eq!(transport.endpoint(), "http://localhost:8000/v1/chat/completions");
    }
}
