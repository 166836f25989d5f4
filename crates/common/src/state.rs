//! Per-conversation state and routing labels.

use crate::message::{Message, Origin};
use serde::{Deserialize, Serialize};

/// Answer returned when no specialist ever produced one.
pub const NO_ANSWER_FALLBACK: &str = "Sorry, I couldn't find an answer.";

/// Label naming the node the runner should execute next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextNode {
    Supervisor,
    Researcher,
    Coder,
    Validator,
    Finish,
}

/// A routing decision as produced by an LLM call.
///
/// `next` is kept as the raw string: the model may hallucinate a label
/// outside the valid set, and it is the runner's job to decide what to do
/// with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub next: String,
    pub reason: String,
}

/// Full state of one conversation thread.
///
/// Invariants: the first message is the original user question and is never
/// mutated or removed; `next` is overwritten by the most recently executed
/// node; `attempts` counts validator rejections within the current turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub next: NextNode,
    #[serde(default)]
    pub attempts: u32,
}

impl ConversationState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(question)],
            next: NextNode::Supervisor,
            attempts: 0,
        }
    }

    /// The original user question.
    pub fn question(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The question currently being worked: the newest user message.
    /// Falls back to the original question on a single-turn thread.
    pub fn current_question(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.origin == Origin::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Render the whole conversation as `origin: content` lines.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.origin, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Newest message produced by a specialist, if any.
    pub fn latest_specialist_answer(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.origin.is_specialist())
    }

    /// The user-visible answer: the newest specialist message, not the
    /// routing or validation chatter around it.
    pub fn final_answer(&self) -> &str {
        self.latest_specialist_answer()
            .map(|m| m.content.as_str())
            .unwrap_or(NO_ANSWER_FALLBACK)
    }
}
