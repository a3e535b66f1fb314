//! Scripted network doubles shared by unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::error::TransportError;
use crate::gemini::{GeminiClient, HttpResponse, HttpTransport, RetryPolicy, Sleeper};
use crate::models::{TransportPreference, TripRequest};

impl TripRequest {
    pub fn new(destination: impl Into<String>, duration_days: i64) -> Self {
        Self {
            source_city: None,
            destination: destination.into(),
            budget: None,
            duration_days,
            start_date: None,
            traveler_count: 1,
            transport_preference: TransportPreference::Mixed,
            free_text_preferences: None,
        }
    }
}

/// Replays queued responses in order; an exhausted script answers with a network error.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    bodies: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script.into()), bodies: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> usize {
        self.bodies.lock().len()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, _url: &str, body: &Value) -> Result<HttpResponse, TransportError> {
        self.bodies.lock().push(body.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".into())))
    }
}

/// Holds every request until [`open`](Self::open) is called, then answers with `response`.
pub struct GatedTransport {
    gate: Notify,
    response: Result<HttpResponse, TransportError>,
}

impl GatedTransport {
    pub fn new(response: Result<HttpResponse, TransportError>) -> Arc<Self> {
        Arc::new(Self { gate: Notify::new(), response })
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl HttpTransport for GatedTransport {
    async fn post_json(&self, _url: &str, _body: &Value) -> Result<HttpResponse, TransportError> {
        self.gate.notified().await;
        self.response.clone()
    }
}

/// A request that never gets an answer.
pub struct HangingTransport;

#[async_trait]
impl HttpTransport for HangingTransport {
    async fn post_json(&self, _url: &str, _body: &Value) -> Result<HttpResponse, TransportError> {
        std::future::pending::<Result<HttpResponse, TransportError>>().await
    }
}

pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { slept: Mutex::new(Vec::new()) })
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration)
    }
}

/// A successful generateContent envelope carrying `text`.
pub fn ok_text(text: &str) -> Result<HttpResponse, TransportError> {
    let body = json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] });
    Ok(HttpResponse { status: 200, body: body.to_string() })
}

pub fn client_with(transport: Arc<dyn HttpTransport>) -> GeminiClient {
    GeminiClient::with_transport(
        "http://gemini.test/models/m:generateContent?key=k".into(),
        transport,
        RecordingSleeper::new(),
        RetryPolicy::default(),
    )
}

pub fn scripted_client(script: Vec<Result<HttpResponse, TransportError>>) -> (GeminiClient, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new(script);
    (client_with(transport.clone()), transport)
}

pub const PARIS_ITINERARY: &str = r#"{
  "days": [
    {
      "dayNumber": 1,
      "title": "Arrival & Left Bank",
      "morning": "Check in near Saint-Germain",
      "afternoon": "Musee d'Orsay",
      "evening": "Seine river cruise",
      "keyActivities": ["Hotel check-in", "Orsay", "River cruise"],
      "estimatedCost": 210,
      "transport": "Metro",
      "accommodation": "Hotel Lutetia",
      "meals": { "breakfast": "Cafe de Flore", "lunch": "Bistro", "dinner": "Brasserie" }
    }
  ],
  "budgetBreakdown": {
    "total": 1500,
    "accommodation": { "amount": 600, "percentage": 40 },
    "food": { "amount": 300, "percentage": 20 },
    "transportation": { "amount": 225, "percentage": 15 },
    "activities": { "amount": 225, "percentage": 15 },
    "shopping": { "amount": 75, "percentage": 5 },
    "emergency": { "amount": 75, "percentage": 5 }
  }
}"#;
