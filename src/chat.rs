use tracing::{info, warn};

use crate::error::{PlannerError, ValidationError};
use crate::models::ChatMessage;
use crate::prompts::{build_chat_prompt, Prompt, TripContext};

pub const EMPTY_REPLY_FALLBACK: &str = "I'm having trouble responding. Please try again.";
pub const ERROR_REPLY_FALLBACK: &str = "Sorry, I encountered an error. Please try again.";

pub const SUGGESTIONS: [&str; 3] = [
    "What are the best times to visit Paris?",
    "Give me budget travel tips",
    "What should I pack for Europe?",
];

/// A submitted message waiting for its reply. Hand `id` back to [`ChatFlow::complete`].
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub id: u64,
    pub prompt: Prompt,
}

/// Append-only conversation. Each submitted turn gets exactly one assistant reply.
#[derive(Debug, Default)]
pub struct ChatFlow {
    history: Vec<ChatMessage>,
    pending: Option<u64>,
    turns: u64,
}

impl ChatFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    /// Starter questions, offered only before the first turn.
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.history.is_empty() {
            &SUGGESTIONS[..]
        } else {
            &[]
        }
    }

    /// Records the user message right away and returns the prompt to send.
    pub fn submit(&mut self, input: &str, context: Option<&TripContext>) -> Result<ChatTurn, PlannerError> {
        let message = input.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyChatMessage.into());
        }
        if self.pending.is_some() {
            return Err(PlannerError::ChatBusy);
        }
        self.history.push(ChatMessage::user(message));
        self.turns += 1;
        self.pending = Some(self.turns);
        info!(turn = self.turns, with_context = context.is_some(), "💬 Chat message submitted");
        Ok(ChatTurn { id: self.turns, prompt: build_chat_prompt(message, context) })
    }

    /// Appends the assistant reply (or a fallback) for turn `id` and lowers the thinking flag.
    /// A reply for a turn that is no longer pending, e.g. after [`clear`](Self::clear), is dropped.
    pub fn complete(&mut self, id: u64, reply: Result<String, PlannerError>) {
        if self.pending != Some(id) {
            warn!(turn = id, "⚠️ Dropping chat reply with no pending turn");
            return;
        }
        let content = match reply {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) | Err(PlannerError::EmptyResponse) => EMPTY_REPLY_FALLBACK.to_string(),
            Err(e) => {
                warn!("⚠️ Chat reply failed: {}", e);
                ERROR_REPLY_FALLBACK.to_string()
            }
        };
        self.history.push(ChatMessage::assistant(content));
        self.pending = None;
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.pending = None;
    }
}
