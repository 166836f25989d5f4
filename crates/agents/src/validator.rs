use std::sync::Arc;

use quorum_common::{ConversationState, Result, RoutingDecision};
use quorum_llm::{ChatMessage, LlmClient, LlmRequest};
use tracing::info;

use crate::decision::parse_decision;

/// Stands in for the answer when no specialist has produced one yet.
pub const NO_ANSWER_SENTINEL: &str = "No answer found.";

const VALIDATOR_SYSTEM_PROMPT: &str = "\
You are a validation agent. You are shown a user's question and the answer \
an agent produced for it. Decide whether the answer actually addresses the \
question.

Respond with a single JSON object and nothing else:
{\"next\": \"<FINISH|supervisor>\", \"reason\": \"<one short sentence>\"}

Use FINISH when the answer addresses the question, even imperfectly. Use \
supervisor only when the answer is missing, empty, or about something else \
entirely.";

/// Quality gate between the specialists and the user.
pub struct ValidatorNode {
    llm: Arc<dyn LlmClient>,
}

impl ValidatorNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn decide(&self, state: &ConversationState) -> Result<RoutingDecision> {
        let question = state.question();
        let answer = state
            .latest_specialist_answer()
            .map(|m| m.content.as_str())
            .unwrap_or(NO_ANSWER_SENTINEL);

        let request = LlmRequest {
            system_prompt: Some(VALIDATOR_SYSTEM_PROMPT.to_string()),
            messages: vec![
                ChatMessage::user(format!("The original question was: '{question}'")),
                ChatMessage::assistant(format!("The agent provided this answer: '{answer}'")),
            ],
            temperature: Some(0.0),
            max_tokens: None,
        };

        let response = self.llm.complete(request).await?;
        let decision = parse_decision(&response.content);

        info!(next = %decision.next, reason = %decision.reason, "Validator decision");
        Ok(decision)
    }

    /// Whether a validator decision accepts the answer.
    pub fn accepts(decision: &RoutingDecision) -> bool {
        decision.next.trim().eq_ignore_ascii_case("finish")
    }
}
