use crate::models::{format_amount, TransportPreference, TripRequest};

/// A prompt ready to be wrapped into a generateContent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_query: String,
    /// Attach the Google Search grounding tool.
    pub grounded_search: bool,
}

pub const ITINERARY_SYSTEM_PROMPT: &str = r#"You are a world-class travel planner. Generate a comprehensive travel plan in JSON format.

Return ONLY a valid JSON object with this EXACT structure (no markdown, no code blocks, no extra text):
{
  "days": [
    {
      "dayNumber": 1,
      "title": "Arrival & City Orientation",
      "morning": "Check into hotel and explore nearby area",
      "afternoon": "Visit main landmark",
      "evening": "Try local cuisine",
      "keyActivities": ["Hotel check-in", "City walking tour", "Landmark visit"],
      "estimatedCost": 150,
      "transport": "Walking and metro",
      "accommodation": "City Center Hotel",
      "meals": {
        "breakfast": "Hotel breakfast",
        "lunch": "Local cafe",
        "dinner": "Traditional restaurant"
      }
    }
  ],
  "budgetBreakdown": {
    "total": 3000,
    "accommodation": { "amount": 1200, "percentage": 40 },
    "food": { "amount": 450, "percentage": 15 },
    "transportation": { "amount": 600, "percentage": 20 },
    "activities": { "amount": 450, "percentage": 15 },
    "shopping": { "amount": 150, "percentage": 5 },
    "emergency": { "amount": 150, "percentage": 5 }
  },
  "recommendations": {
    "mustVisit": ["Landmark 1", "Landmark 2", "Landmark 3"],
    "localFood": ["Dish 1", "Dish 2", "Dish 3"],
    "hiddenGems": ["Hidden spot 1", "Hidden spot 2"]
  },
  "logistics": {
    "suggestedStays": [
      { "name": "Budget Hotel", "type": "Budget", "location": "Downtown", "price": 80 },
      { "name": "Comfort Hotel", "type": "Mid-range", "location": "City Center", "price": 150 }
    ],
    "diningOptions": [
      { "name": "Local Bistro", "cuisine": "Local", "specialty": "Traditional dishes", "priceLevel": 2 },
      { "name": "Fine Dining", "cuisine": "International", "specialty": "Fusion cuisine", "priceLevel": 3 }
    ],
    "packingList": ["Passport", "Comfortable shoes", "Weather appropriate clothing", "Chargers", "First aid"],
    "emergency": {
      "embassy": "Check local embassy website for contact",
      "police": "911 or local emergency number",
      "hospitals": ["City General Hospital", "International Medical Center"]
    }
  }
}"#;

pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful, friendly travel assistant. Answer questions about travel planning, destinations, and provide helpful tips. Keep responses concise (2-3 sentences) and friendly.";

impl TransportPreference {
    pub fn phrase(self) -> &'static str {
        match self {
            TransportPreference::Mixed => "Use mix of efficient transport",
            TransportPreference::Flight => "Prefer flights",
            TransportPreference::Train => "Prefer train travel",
            TransportPreference::Bus => "Prefer bus travel",
            TransportPreference::Car => "Prefer car/driving",
        }
    }
}

/// Expects an already validated request; optional clauses appear only when present.
pub fn build_itinerary_prompt(trip: &TripRequest) -> Prompt {
    let mut query = format!(
        "Create a detailed {}-day travel itinerary for {}.",
        trip.duration_days, trip.destination
    );
    if let Some(source) = &trip.source_city {
        query.push_str(&format!(" Starting from {source}."));
    }
    if let Some(budget) = trip.budget {
        query.push_str(&format!(" Total budget: ${} USD.", format_amount(budget)));
    }
    query.push_str(&format!(" For {} traveler(s).", trip.traveler_count));
    if let Some(date) = trip.start_date {
        query.push_str(&format!(" Starting {}.", date.format("%Y-%m-%d")));
    }
    query.push_str(&format!(" Transport: {}.", trip.transport_preference.phrase()));
    if let Some(prefs) = &trip.free_text_preferences {
        query.push_str(&format!(" Preferences: {prefs}."));
    }
    query.push_str(" Return ONLY the JSON object, no markdown formatting.");

    Prompt {
        system_instruction: ITINERARY_SYSTEM_PROMPT.to_string(),
        user_query: query,
        grounded_search: true,
    }
}

/// Compact summary of the active itinerary, read by chat turns.
#[derive(Debug, Clone, PartialEq)]
pub struct TripContext {
    pub destination: String,
    pub duration_days: i64,
    pub budget: Option<f64>,
}

impl TripContext {
    pub fn from_trip(trip: &TripRequest) -> Self {
        Self { destination: trip.destination.clone(), duration_days: trip.duration_days, budget: trip.budget }
    }

    pub fn suffix(&self) -> String {
        let budget = self.budget.map(format_amount).unwrap_or_else(|| "flexible".to_string());
        format!(" [Trip context: {}, {} days, ${} budget]", self.destination, self.duration_days, budget)
    }
}

pub fn build_chat_prompt(user_message: &str, context: Option<&TripContext>) -> Prompt {
    let mut query = user_message.to_string();
    if let Some(ctx) = context {
        query.push_str(&ctx.suffix());
    }
    Prompt {
        system_instruction: CHAT_SYSTEM_PROMPT.to_string(),
        user_query: query,
        grounded_search: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_request_has_only_required_clauses() {
        let prompt = build_itinerary_prompt(&TripRequest::new("Lisbon", 2));
        assert_eq!(
            prompt.user_query,
            "Create a detailed 2-day travel itinerary for Lisbon. For 1 traveler(s). \
             Transport: Use mix of efficient transport. Return ONLY the JSON object, no markdown formatting."
        );
        assert!(prompt.grounded_search);
        assert!(prompt.system_instruction.contains("\"days\""));
    }

    #[test]
    fn full_request_appends_every_clause_in_order() {
        let mut trip = TripRequest::new("Paris", 3);
        trip.source_city = Some("London".into());
        trip.budget = Some(1500.0);
        trip.traveler_count = 2;
        trip.start_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        trip.transport_preference = TransportPreference::Train;
        trip.free_text_preferences = Some("museums".into());
        assert_eq!(
            build_itinerary_prompt(&trip).user_query,
            "Create a detailed 3-day travel itinerary for Paris. Starting from London. Total budget: $1500 USD. \
             For 2 traveler(s). Starting 2025-06-01. Transport: Prefer train travel. Preferences: museums. \
             Return ONLY the JSON object, no markdown formatting."
        );
    }

    #[test]
    fn transport_phrases() {
        assert_eq!(TransportPreference::Flight.phrase(), "Prefer flights");
        assert_eq!(TransportPreference::Car.phrase(), "Prefer car/driving");
        assert_eq!(TransportPreference::Bus.phrase(), "Prefer bus travel");
    }

    #[test]
    fn chat_prompt_without_context_is_message_only() {
        let prompt = build_chat_prompt("Best time to visit Tokyo?", None);
        assert_eq!(prompt.user_query, "Best time to visit Tokyo?");
        assert_eq!(prompt.system_instruction, CHAT_SYSTEM_PROMPT);
        assert!(!prompt.grounded_search);
    }

    #[test]
    fn chat_prompt_appends_trip_context() {
        let ctx = TripContext { destination: "Paris".into(), duration_days: 3, budget: Some(1500.0) };
        assert_eq!(
            build_chat_prompt("Where to eat?", Some(&ctx)).user_query,
            "Where to eat? [Trip context: Paris, 3 days, $1500 budget]"
        );
        let flexible = TripContext { budget: None, ..ctx };
        assert_eq!(flexible.suffix(), " [Trip context: Paris, 3 days, $flexible budget]");
    }
}
