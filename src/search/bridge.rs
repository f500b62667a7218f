//! Host bridges
//!
//! The host bridge is the external capability that answers a natural
//! language request. It is injected into the viewer; when none is
//! configured, smart search is unavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::prompt::GENERATE_RESPONSE_EVENT;

/// Bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Host bridge unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Request(String),

    #[error("Failed to decode host response: {0}")]
    Decode(String),
}

/// Answer returned by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(default)]
    pub text: Option<String>,
}

impl BridgeResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Text if present and non-empty
    pub fn answer(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Host bridge trait
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Check whether the host answers at all
    async fn is_available(&self) -> bool;

    /// Send one request and wait for its answer
    async fn request(&self, event: &str, payload: Value) -> Result<BridgeResponse, BridgeError>;
}

/// Generic host endpoint: POSTs `{ "event", "payload" }` and expects
/// `{ "text": ... }` back
pub struct HttpBridge {
    client: reqwest::Client,
    url: String,
}

impl HttpBridge {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Serialize)]
struct HostRequest<'a> {
    event: &'a str,
    payload: Value,
}

#[async_trait]
impl HostBridge for HttpBridge {
    fn name(&self) -> &str {
        "http"
    }

    async fn is_available(&self) -> bool {
        self.client.head(&self.url).send().await.is_ok()
    }

    async fn request(&self, event: &str, payload: Value) -> Result<BridgeResponse, BridgeError> {
        let response = self
            .client
            .post(&self.url)
            .json(&HostRequest { event, payload })
            .send()
            .await
            .map_err(|e| BridgeError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Request(format!("Host returned {}: {}", status, body)));
        }

        response
            .json::<BridgeResponse>()
            .await
            .map_err(|e| BridgeError::Decode(e.to_string()))
    }
}

/// Local Ollama server answering through `/api/generate`
pub struct OllamaBridge {
    client: reqwest::Client,
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llama3")
    model: String,
}

impl OllamaBridge {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn default_url() -> Self {
        Self::new("http://localhost:11434", "llama3")
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl HostBridge for OllamaBridge {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn request(&self, event: &str, payload: Value) -> Result<BridgeResponse, BridgeError> {
        if event != GENERATE_RESPONSE_EVENT {
            return Err(BridgeError::Request(format!("Unsupported host event: {}", event)));
        }
        let prompt = payload["topic"]
            .as_str()
            .ok_or_else(|| BridgeError::Request("Missing topic in payload".to_string()))?;

        let url = format!("{}/api/generate", self.base_url);
        let request = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::Unavailable(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Request(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Decode(e.to_string()))?;

        Ok(BridgeResponse {
            text: result["response"].as_str().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_answer_requires_text() {
        assert_eq!(BridgeResponse::default().answer(), None);
        assert_eq!(BridgeResponse::text("").answer(), None);
        assert_eq!(BridgeResponse::text(" ").answer(), Some(" "));
    }

    #[test]
    fn test_response_decodes_without_text() {
        let response: BridgeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text, None);
    }

    #[tokio::test]
    async fn test_http_bridge_round_trip() {
        let app = Router::new().route(
            "/host",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["event"], "generate_response");
                let topic = body["payload"]["topic"].as_str().unwrap_or_default();
                Json(json!({ "text": format!("echo: {}", topic) }))
            }),
        );
        let base = serve(app).await;
        let bridge = HttpBridge::new(&format!("{}/host", base));

        let response = bridge
            .request(GENERATE_RESPONSE_EVENT, json!({ "topic": "why?" }))
            .await
            .unwrap();
        assert_eq!(response.answer(), Some("echo: why?"));
    }

    #[tokio::test]
    async fn test_http_bridge_error_status() {
        let app = Router::new().route(
            "/host",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "kernel panic") }),
        );
        let base = serve(app).await;
        let bridge = HttpBridge::new(&format!("{}/host", base));

        let err = bridge
            .request(GENERATE_RESPONSE_EVENT, json!({ "topic": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Request(ref m) if m.contains("kernel panic")));
    }

    #[tokio::test]
    async fn test_ollama_bridge_maps_generate() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "llama3");
                assert_eq!(body["stream"], false);
                Json(json!({ "response": body["prompt"] }))
            }),
        );
        let base = serve(app).await;
        let bridge = OllamaBridge::new(&format!("{}/", base), "llama3");

        let response = bridge
            .request(GENERATE_RESPONSE_EVENT, json!({ "topic": "prompt text" }))
            .await
            .unwrap();
        assert_eq!(response.text.as_deref(), Some("prompt text"));
    }

    #[tokio::test]
    async fn test_ollama_rejects_other_events() {
        let bridge = OllamaBridge::default_url();
        let err = bridge.request("shutdown", json!({})).await.unwrap_err();
        assert!(matches!(err, BridgeError::Request(_)));
    }
}
