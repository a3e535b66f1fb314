use tracing::{error, info, warn};

use crate::error::PlannerError;
use crate::extract::extract_json;
use crate::gemini::GeminiClient;
use crate::models::{ItineraryBundle, TripRequest};
use crate::prompts::{build_itinerary_prompt, Prompt, TripContext};
use crate::schema::validate_itinerary;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Generating { id: u64, trip: TripRequest },
    Ready { bundle: ItineraryBundle, expanded_day: Option<u32> },
    Failed { reason: String },
}

impl GenerationState {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Generating { .. } => "generating",
            GenerationState::Ready { .. } => "ready",
            GenerationState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success(ItineraryBundle),
    ValidationFailure(String),
    TransportFailure(String),
}

/// Work handed out by [`ItineraryGenerationFlow::start`]; run it with [`execute`].
///
/// `id` must be passed back to [`ItineraryGenerationFlow::complete`]; an outcome
/// for any other generation is dropped.
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    pub id: u64,
    pub trip: TripRequest,
    pub prompt: Prompt,
}

/// Owns the `Idle -> Generating -> Ready | Failed` lifecycle of the displayed itinerary.
#[derive(Debug, Default)]
pub struct ItineraryGenerationFlow {
    state: GenerationState,
    generations: u64,
}

impl ItineraryGenerationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    /// Validates the trip and enters `Generating`. On a validation error the state is untouched.
    pub fn start(&mut self, trip: &TripRequest) -> Result<PendingGeneration, PlannerError> {
        if matches!(self.state, GenerationState::Generating { .. }) {
            return Err(PlannerError::AlreadyGenerating);
        }
        let trip = trip.validated()?;
        let prompt = build_itinerary_prompt(&trip);
        self.generations += 1;
        let id = self.generations;
        info!(id, "🚀 Generating {}-day itinerary for {}", trip.duration_days, trip.destination);
        self.state = GenerationState::Generating { id, trip: trip.clone() };
        Ok(PendingGeneration { id, trip, prompt })
    }

    /// Installs the outcome of generation `id`. Ignored unless that generation is still in flight.
    pub fn complete(&mut self, id: u64, outcome: GenerationOutcome) {
        match self.state {
            GenerationState::Generating { id: current, .. } if current == id => {}
            _ => {
                warn!(id, "⚠️ Dropping generation outcome, flow is {}", self.state.name());
                return;
            }
        }
        self.state = match outcome {
            GenerationOutcome::Success(bundle) => {
                info!("✅ Itinerary ready with {} day(s)", bundle.itinerary.days.len());
                GenerationState::Ready { bundle, expanded_day: Some(1) }
            }
            GenerationOutcome::ValidationFailure(reason) | GenerationOutcome::TransportFailure(reason) => {
                error!("❌ Itinerary generation failed: {}", reason);
                GenerationState::Failed { reason }
            }
        };
    }

    /// Collapses `day` if it is the expanded one, otherwise expands it. Returns false unless `Ready`.
    pub fn toggle_day(&mut self, day: u32) -> bool {
        match &mut self.state {
            GenerationState::Ready { expanded_day, .. } => {
                *expanded_day = if *expanded_day == Some(day) {
                    None
                } else {
                    Some(day)
                };
                true
            }
            _ => false,
        }
    }

    /// Back to `Idle`, dropping any itinerary. An in-flight generation is abandoned
    /// and its outcome will be dropped when it arrives.
    pub fn reset(&mut self) {
        if let GenerationState::Generating { id, .. } = self.state {
            warn!(id, "⚠️ Abandoning in-flight generation");
        }
        self.state = GenerationState::Idle;
    }

    pub fn bundle(&self) -> Option<&ItineraryBundle> {
        match &self.state {
            GenerationState::Ready { bundle, .. } => Some(bundle),
            _ => None,
        }
    }

    pub fn expanded_day(&self) -> Option<u32> {
        match &self.state {
            GenerationState::Ready { expanded_day, .. } => *expanded_day,
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            GenerationState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn trip_context(&self) -> Option<TripContext> {
        self.bundle().map(|b| TripContext::from_trip(&b.trip))
    }
}

/// Calls the service, extracts and validates the payload. Never panics on bad output.
pub async fn execute(client: &GeminiClient, pending: PendingGeneration) -> GenerationOutcome {
    let result = match client.generate_text(&pending.prompt).await {
        Ok(text) => validate_itinerary(&extract_json(&text)).map_err(PlannerError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(itinerary) => GenerationOutcome::Success(ItineraryBundle { trip: pending.trip, itinerary }),
        Err(e @ PlannerError::Schema(_)) => GenerationOutcome::ValidationFailure(e.user_message()),
        Err(e) => GenerationOutcome::TransportFailure(e.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::testing::{ok_text, scripted_client, PARIS_ITINERARY};
    use crate::gemini::HttpResponse;
    use pretty_assertions::assert_eq;

    fn paris() -> TripRequest {
        let mut trip = TripRequest::new("Paris", 3);
        trip.budget = Some(1500.0);
        trip
    }

    async fn generate(flow: &mut ItineraryGenerationFlow, client: &GeminiClient, trip: &TripRequest) {
        let pending = flow.start(trip).unwrap();
        let id = pending.id;
        let outcome = execute(client, pending).await;
        flow.complete(id, outcome);
    }

    #[tokio::test]
    async fn invalid_trip_never_reaches_network() {
        let (_client, transport) = scripted_client(vec![ok_text(PARIS_ITINERARY)]);
        let mut flow = ItineraryGenerationFlow::new();
        for trip in [TripRequest::new("", 3), TripRequest::new("Paris", 0)] {
            let err = flow.start(&trip).unwrap_err();
            assert_eq!(err.user_message(), "Please enter a destination and duration (minimum 1 day).");
            assert_eq!(flow.state(), &GenerationState::Idle);
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn success_installs_bundle_and_expands_day_one() {
        let (client, _) = scripted_client(vec![ok_text(&format!("Sure!\n```json\n{PARIS_ITINERARY}\n```"))]);
        let mut flow = ItineraryGenerationFlow::new();
        generate(&mut flow, &client, &paris()).await;

        let bundle = flow.bundle().expect("ready");
        assert!(!bundle.itinerary.days.is_empty());
        assert_eq!(bundle.trip.destination, "Paris");
        assert_eq!(flow.expanded_day(), Some(1));
        assert_eq!(flow.trip_context().map(|c| c.suffix()), Some(" [Trip context: Paris, 3 days, $1500 budget]".into()));
    }

    #[tokio::test]
    async fn schema_failure_is_validation_outcome() {
        let (client, _) = scripted_client(vec![ok_text(r#"{"budgetBreakdown":{"total":1}}"#)]);
        let pending = ItineraryGenerationFlow::new().start(&paris()).unwrap();
        assert_eq!(
            execute(&client, pending).await,
            GenerationOutcome::ValidationFailure(
                "Failed to generate itinerary: Invalid data structure: missing or empty days".into()
            )
        );
    }

    #[tokio::test]
    async fn service_error_moves_to_failed_with_reason() {
        let (client, _) = scripted_client(vec![Ok(HttpResponse {
            status: 200,
            body: r#"{"error":{"message":"quota exceeded"}}"#.into(),
        })]);
        let mut flow = ItineraryGenerationFlow::new();
        generate(&mut flow, &client, &paris()).await;
        assert_eq!(flow.state(), &GenerationState::Failed { reason: "API Error: quota exceeded".into() });
        assert_eq!(flow.bundle(), None);
    }

    #[tokio::test]
    async fn transport_failure_keeps_no_partial_state() {
        let (client, _) = scripted_client(vec![
            Err(TransportError::Network("down".into())),
            Err(TransportError::Network("down".into())),
            Err(TransportError::Network("down".into())),
        ]);
        let mut flow = ItineraryGenerationFlow::new();
        generate(&mut flow, &client, &paris()).await;
        assert_eq!(flow.error(), Some("Failed to generate itinerary: network error: down"));
        assert_eq!(flow.trip_context(), None);
    }

    #[tokio::test]
    async fn regenerating_from_ready_discards_previous_itinerary() {
        let (client, _) = scripted_client(vec![ok_text(PARIS_ITINERARY), ok_text("no json here")]);
        let mut flow = ItineraryGenerationFlow::new();
        generate(&mut flow, &client, &paris()).await;
        assert!(flow.bundle().is_some());

        flow.start(&TripRequest::new("Rome", 2)).unwrap();
        assert_eq!(flow.state().name(), "generating");
        assert_eq!(flow.bundle(), None);
        assert!(matches!(flow.start(&paris()), Err(PlannerError::AlreadyGenerating)));
    }

    #[test]
    fn toggle_day_collapses_and_switches() {
        let mut flow = ItineraryGenerationFlow::new();
        assert!(!flow.toggle_day(1));
        let pending = flow.start(&paris()).unwrap();
        let itinerary = validate_itinerary(PARIS_ITINERARY).unwrap();
        flow.complete(pending.id, GenerationOutcome::Success(ItineraryBundle { trip: paris(), itinerary }));

        assert!(flow.toggle_day(1));
        assert_eq!(flow.expanded_day(), None);
        flow.toggle_day(2);
        assert_eq!(flow.expanded_day(), Some(2));
    }

    #[test]
    fn outcome_outside_generating_is_dropped() {
        let mut flow = ItineraryGenerationFlow::new();
        flow.complete(1, GenerationOutcome::TransportFailure("late".into()));
        assert_eq!(flow.state(), &GenerationState::Idle);
    }

    #[test]
    fn reset_abandons_generation_and_late_outcome_is_dropped() {
        let mut flow = ItineraryGenerationFlow::new();
        let abandoned = flow.start(&paris()).unwrap();
        flow.reset();
        assert_eq!(flow.state(), &GenerationState::Idle);

        let current = flow.start(&TripRequest::new("Rome", 2)).unwrap();
        assert_ne!(abandoned.id, current.id);
        flow.complete(abandoned.id, GenerationOutcome::TransportFailure("stale".into()));
        assert_eq!(flow.state().name(), "generating");

        flow.complete(current.id, GenerationOutcome::TransportFailure("boom".into()));
        assert_eq!(flow.error(), Some("boom"));
    }
}
