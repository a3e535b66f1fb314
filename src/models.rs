use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::error::ValidationError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportPreference {
    #[default]
    Mixed,
    Flight,
    Train,
    Bus,
    Car,
}

fn default_travelers() -> i64 {
    1
}

/// Counts are signed so out-of-range input such as `-1` reaches validation
/// instead of failing deserialization. Numeric strings (`"3"`) are accepted too.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    #[serde(default)]
    pub source_city: Option<String>,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub budget: Option<f64>, // USD
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default, alias = "duration")]
    pub duration_days: i64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default = "default_travelers", alias = "travelers")]
    pub traveler_count: i64,
    #[serde(default, alias = "transportType")]
    pub transport_preference: TransportPreference,
    #[serde(default, alias = "preferences")]
    pub free_text_preferences: Option<String>,
}

impl TripRequest {
    /// Checks the request and returns a trimmed copy with blank optional text dropped.
    pub fn validated(&self) -> Result<TripRequest, ValidationError> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(ValidationError::EmptyDestination);
        }
        if self.duration_days < 1 {
            return Err(ValidationError::InvalidDuration);
        }
        if self.traveler_count < 1 {
            return Err(ValidationError::InvalidTravelerCount);
        }
        if matches!(self.budget, Some(b) if !(b > 0.0)) {
            return Err(ValidationError::NonPositiveBudget);
        }
        Ok(TripRequest {
            source_city: non_blank(&self.source_city),
            destination: destination.to_string(),
            free_text_preferences: non_blank(&self.free_text_preferences),
            ..self.clone()
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

// --- Itinerary ---

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Meals {
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day_number: u32,
    pub title: String,
    pub morning: String,
    pub afternoon: String,
    pub evening: String,
    pub key_activities: Vec<String>,
    pub estimated_cost: f64,
    pub transport: String,
    pub accommodation: String,
    pub meals: Meals,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BudgetBucket {
    pub key: String,
    pub amount: f64,
    pub percentage: f64,
}

/// Bucket amounts and percentages are kept as returned; they are not reconciled with `total`.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct BudgetBreakdown {
    pub total: Option<f64>,
    pub buckets: Vec<BudgetBucket>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub must_visit: Vec<String>,
    pub local_food: Vec<String>,
    pub hidden_gems: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Stay {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiningOption {
    pub name: String,
    pub cuisine: String,
    pub specialty: String,
    pub price_level: Option<u8>, // 1..=3
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct EmergencyContacts {
    pub embassy: String,
    pub police: String,
    pub hospitals: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Logistics {
    pub suggested_stays: Vec<Stay>,
    pub dining_options: Vec<DiningOption>,
    pub packing_list: Vec<String>,
    pub emergency: EmergencyContacts,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub days: Vec<DayPlan>,
    pub budget_breakdown: Option<BudgetBreakdown>,
    pub recommendations: Option<Recommendations>,
    pub logistics: Option<Logistics>,
}

/// A validated itinerary together with the trip it was generated for.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryBundle {
    pub trip: TripRequest,
    pub itinerary: Itinerary,
}

// --- Chat ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatRequest {
    pub message: String,
}

/// Formats a dollar amount without a trailing `.0` for whole numbers.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
