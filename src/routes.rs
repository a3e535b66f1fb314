use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    chat::ChatFlow,
    error::PlannerError,
    export::{export_filename, render_itinerary},
    flow::{execute, GenerationState, ItineraryGenerationFlow},
    gemini::GeminiClient,
    models::{ChatMessage, ChatRequest, Itinerary, TripRequest},
};

/// Both flows share one client; locks are never held across a network call.
///
/// The call and its completion run on a spawned task, so an outcome always lands
/// in its flow even if the HTTP handler that started it is dropped.
#[derive(Clone)]
pub struct AppState {
    pub itinerary: Arc<RwLock<ItineraryGenerationFlow>>,
    pub chat: Arc<RwLock<ChatFlow>>,
    pub gemini: Arc<GeminiClient>,
}

impl AppState {
    pub fn new(gemini: GeminiClient) -> Self {
        Self {
            itinerary: Arc::new(RwLock::new(ItineraryGenerationFlow::new())),
            chat: Arc::new(RwLock::new(ChatFlow::new())),
            gemini: Arc::new(gemini),
        }
    }

    pub async fn generate_itinerary(&self, trip: &TripRequest) -> Result<ItineraryView, PlannerError> {
        let pending = self.itinerary.write().start(trip)?;
        let state = self.clone();
        tokio::spawn(async move {
            let id = pending.id;
            let outcome = execute(&state.gemini, pending).await;
            let mut flow = state.itinerary.write();
            flow.complete(id, outcome);
            ItineraryView::of(&flow)
        })
        .await
        .map_err(|e| PlannerError::Interrupted(e.to_string()))
    }

    pub async fn send_chat(&self, message: &str) -> Result<ChatView, PlannerError> {
        let context = self.itinerary.read().trip_context();
        let turn = self.chat.write().submit(message, context.as_ref())?;
        let state = self.clone();
        tokio::spawn(async move {
            let reply = state.gemini.generate_text(&turn.prompt).await;
            let mut chat = state.chat.write();
            chat.complete(turn.id, reply);
            ChatView::of(&chat)
        })
        .await
        .map_err(|e| PlannerError::Interrupted(e.to_string()))
    }

    /// Itinerary back to idle and chat history cleared.
    pub fn reset_all(&self) {
        self.itinerary.write().reset();
        self.chat.write().clear();
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryView {
    pub state: &'static str,
    pub expanded_day: Option<u32>,
    pub trip: Option<TripRequest>,
    pub itinerary: Option<Itinerary>,
    pub error: Option<String>,
}

impl ItineraryView {
    fn of(flow: &ItineraryGenerationFlow) -> Self {
        let trip = match flow.state() {
            GenerationState::Generating { trip, .. } => Some(trip.clone()),
            GenerationState::Ready { bundle, .. } => Some(bundle.trip.clone()),
            _ => None,
        };
        Self {
            state: flow.state().name(),
            expanded_day: flow.expanded_day(),
            trip,
            itinerary: flow.bundle().map(|b| b.itinerary.clone()),
            error: flow.error().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub thinking: bool,
    pub suggestions: Vec<&'static str>,
}

impl ChatView {
    fn of(chat: &ChatFlow) -> Self {
        Self {
            messages: chat.history().to_vec(),
            thinking: chat.is_thinking(),
            suggestions: chat.suggestions().to_vec(),
        }
    }
}

pub struct ApiError(StatusCode, String);

impl From<PlannerError> for ApiError {
    fn from(e: PlannerError) -> Self {
        let status = match e {
            PlannerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PlannerError::AlreadyGenerating | PlannerError::ChatBusy => StatusCode::CONFLICT,
            PlannerError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        ApiError(status, e.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/itinerary", post(generate_itinerary).get(get_itinerary))
        .route("/api/itinerary/day/:day/toggle", post(toggle_day))
        .route("/api/itinerary/reset", post(reset_itinerary))
        .route("/api/itinerary/export", get(export_itinerary))
        .route("/api/chat", post(send_chat).get(get_chat))
        .route("/api/reset", post(reset_all))
        .with_state(state)
}

pub async fn generate_itinerary(
    State(state): State<AppState>,
    Json(body): Json<TripRequest>,
) -> Result<Json<ItineraryView>, ApiError> {
    let view = state.generate_itinerary(&body).await?;
    match &view.error {
        Some(reason) => Err(ApiError(StatusCode::BAD_GATEWAY, reason.clone())),
        None => Ok(Json(view)),
    }
}

pub async fn get_itinerary(State(state): State<AppState>) -> Json<ItineraryView> {
    Json(ItineraryView::of(&state.itinerary.read()))
}

pub async fn toggle_day(Path(day): Path<u32>, State(state): State<AppState>) -> Result<Json<ItineraryView>, StatusCode> {
    let mut flow = state.itinerary.write();
    if !flow.toggle_day(day) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(ItineraryView::of(&flow)))
}

pub async fn reset_itinerary(State(state): State<AppState>) -> Json<ItineraryView> {
    let mut flow = state.itinerary.write();
    flow.reset();
    tracing::info!("🔄 Itinerary reset, flow is {}", flow.state().name());
    Json(ItineraryView::of(&flow))
}

pub async fn export_itinerary(State(state): State<AppState>) -> Response {
    let flow = state.itinerary.read();
    let Some(bundle) = flow.bundle() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let text = render_itinerary(&bundle.trip.destination, &bundle.itinerary);
    let filename = export_filename(&bundle.trip.destination).replace('"', "_");
    tracing::info!("📄 Exporting itinerary as {}", filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        text,
    )
        .into_response()
}

pub async fn get_chat(State(state): State<AppState>) -> Json<ChatView> {
    Json(ChatView::of(&state.chat.read()))
}

pub async fn send_chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Result<Json<ChatView>, ApiError> {
    Ok(Json(state.send_chat(&body.message).await?))
}

pub async fn reset_all(State(state): State<AppState>) -> StatusCode {
    state.reset_all();
    tracing::info!("🔄 Full reset");
    StatusCode::NO_CONTENT
}
