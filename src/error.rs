use thiserror::Error;

/// Bad user input, caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("destination is required")]
    EmptyDestination,
    #[error("duration must be at least 1 day")]
    InvalidDuration,
    #[error("traveler count must be at least 1")]
    InvalidTravelerCount,
    #[error("budget must be a positive amount")]
    NonPositiveBudget,
    #[error("message is empty")]
    EmptyChatMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request failed after retries ({attempts} attempts)")]
    RetriesExhausted { attempts: u32 },
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Malformed or structurally incomplete itinerary payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),
    #[error("Invalid data structure: missing or empty days")]
    MissingDays,
    #[error("Invalid data structure: day at index {index} has no dayNumber")]
    InvalidDay { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("service error: {0}")]
    Service(String),
    #[error("no usable text in response")]
    EmptyResponse,
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("an itinerary is already being generated")]
    AlreadyGenerating,
    #[error("still waiting for the previous reply")]
    ChatBusy,
    /// The background task driving a request panicked or was cancelled.
    #[error("request task ended unexpectedly: {0}")]
    Interrupted(String),
}

impl PlannerError {
    /// The single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Validation(ValidationError::EmptyDestination | ValidationError::InvalidDuration) => {
                "Please enter a destination and duration (minimum 1 day).".to_string()
            }
            PlannerError::Validation(e) => format!("Please check your trip details: {e}."),
            PlannerError::Service(message) => format!("API Error: {message}"),
            PlannerError::EmptyResponse => "No response from AI. Please try again.".to_string(),
            PlannerError::Transport(e) => format!("Failed to generate itinerary: {e}"),
            PlannerError::Schema(e) => format!("Failed to generate itinerary: {e}"),
            PlannerError::AlreadyGenerating | PlannerError::ChatBusy | PlannerError::Interrupted(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_follow_failure_kind() {
        assert_eq!(
            PlannerError::from(ValidationError::EmptyDestination).user_message(),
            "Please enter a destination and duration (minimum 1 day)."
        );
        assert_eq!(PlannerError::Service("quota".into()).user_message(), "API Error: quota");
        assert_eq!(PlannerError::EmptyResponse.user_message(), "No response from AI. Please try again.");
        assert_eq!(
            PlannerError::from(SchemaError::MissingDays).user_message(),
            "Failed to generate itinerary: Invalid data structure: missing or empty days"
        );
        assert!(PlannerError::from(TransportError::RetriesExhausted { attempts: 3 })
            .user_message()
            .contains("request failed after retries"));
    }
}
