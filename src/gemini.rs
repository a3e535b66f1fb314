use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use serde_with::{serde_as, DefaultOnNull};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{PlannerError, TransportError};
use crate::prompts::Prompt;

const RATE_LIMITED: u16 = 429;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP POST with a JSON body. Implementations do not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Deterministic exponential backoff: attempt `n` (0-based) waits `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts, ..Self::default() }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Retries only on HTTP 429 and on transport failures; every other status is handed back as-is.
pub struct ResilientRequestClient {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl ResilientRequestClient {
    pub fn new(transport: Arc<dyn HttpTransport>, sleeper: Arc<dyn Sleeper>, policy: RetryPolicy) -> Self {
        Self { transport, sleeper, policy }
    }

    pub async fn send(&self, url: &str, body: &Value) -> Result<HttpResponse, TransportError> {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 0..attempts {
            match self.transport.post_json(url, body).await {
                Ok(response) if response.status != RATE_LIMITED => {
                    debug!(attempt, status = response.status, "send: accepted response");
                    return Ok(response);
                }
                Ok(_) => {
                    let backoff = self.policy.delay_for(attempt);
                    warn!(attempt, backoff_ms = backoff.as_millis() as u64, "⏳ Rate limited (429), backing off");
                    self.sleeper.sleep(backoff).await;
                }
                Err(e) if attempt + 1 == attempts => {
                    error!(attempt, "❌ Request to {} failed: {}", redact_key(url), e);
                    return Err(e);
                }
                Err(e) => {
                    let backoff = self.policy.delay_for(attempt);
                    warn!(attempt, backoff_ms = backoff.as_millis() as u64, "⚠️ Transport error, retrying: {}", e);
                    self.sleeper.sleep(backoff).await;
                }
            }
        }
        Err(TransportError::RetriesExhausted { attempts })
    }
}

pub fn redact_key(url: &str) -> String {
    match url.find("key=") {
        Some(idx) => format!("{}***", &url[..idx + 4]),
        None => url.to_string(),
    }
}

pub struct GeminiClient {
    requests: ResilientRequestClient,
    url: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_transport(
            config.generate_url(),
            Arc::new(ReqwestTransport::new()),
            Arc::new(TokioSleeper),
            RetryPolicy::with_max_attempts(config.max_attempts),
        )
    }

    pub fn with_transport(
        url: String,
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self { requests: ResilientRequestClient::new(transport, sleeper, policy), url }
    }

    /// Sends a prompt and returns the first candidate's text.
    pub async fn generate_text(&self, prompt: &Prompt) -> Result<String, PlannerError> {
        info!("🔗 Making request to: {}", redact_key(&self.url));
        let response = self.requests.send(&self.url, &request_body(prompt)).await?;
        info!("📥 Response status: {}", response.status);
        interpret_response(&response)
    }
}

pub fn request_body(prompt: &Prompt) -> Value {
    let mut body = json!({
        "contents": [{
            "parts": [{"text": prompt.user_query}]
        }],
        "systemInstruction": {
            "parts": [{"text": prompt.system_instruction}]
        }
    });
    if prompt.grounded_search {
        body["tools"] = json!([{ "google_search": {} }]);
    }
    body
}

/// A 2xx response can still carry an `error` object; that is a failure too.
fn interpret_response(response: &HttpResponse) -> Result<String, PlannerError> {
    let parsed: GeminiResponse = match serde_json::from_str(&response.body) {
        Ok(parsed) => parsed,
        Err(_) if !response.is_success() => {
            return Err(TransportError::Status { status: response.status, body: response.body.clone() }.into());
        }
        Err(e) => return Err(TransportError::Network(format!("unreadable response body: {e}")).into()),
    };

    if let Some(api_error) = parsed.error {
        let message = api_error.message.filter(|m| !m.is_empty()).unwrap_or_else(|| "Unknown error".to_string());
        error!("❌ API Error response: {}", message);
        return Err(PlannerError::Service(message));
    }
    if !response.is_success() {
        return Err(TransportError::Status { status: response.status, body: response.body.clone() }.into());
    }

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(PlannerError::EmptyResponse)
}

// --- Response Parsing Helpers ---

#[serde_as]
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[serde_as]
#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}
