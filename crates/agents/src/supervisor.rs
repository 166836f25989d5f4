use std::sync::Arc;

use quorum_common::{ConversationState, Result, RoutingDecision};
use quorum_llm::{ChatMessage, LlmClient, LlmRequest};
use tracing::info;

use crate::decision::parse_decision;

const SUPERVISOR_SYSTEM_PROMPT: &str = "\
You are the supervisor of a team of specialist agents. Your job is to route \
the conversation to the agent best suited for the next step, or to finish \
when the question has been answered.

Available agents:
- researcher: searches the web and answers questions that need factual \
lookups, current events, or general knowledge.
- coder: writes and executes Python code for calculations, data \
transformations, and anything requiring precise computation.

Respond with a single JSON object and nothing else:
{\"next\": \"<researcher|coder|FINISH>\", \"reason\": \"<one short sentence>\"}

Route to FINISH only when the conversation already contains a complete \
answer to the user's question.";

/// Routing node. Reads the conversation and decides which node runs next.
pub struct SupervisorNode {
    llm: Arc<dyn LlmClient>,
}

impl SupervisorNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Build the supervisor's view of the conversation. The scratchpad of
    /// prior work is included only once some work exists.
    fn build_input(state: &ConversationState) -> String {
        let question = state.question();

        if state.messages.len() <= 1 {
            return format!("The user's question is: '{question}'");
        }

        let scratchpad: String = state
            .messages
            .iter()
            .skip(1)
            .map(|m| format!("{}: {}", m.origin, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "The user's original question is: '{question}'\n\n\
             The following work has been done so far:\n{scratchpad}\n\n\
             Based on this, what is the next best step?"
        )
    }

    pub async fn decide(&self, state: &ConversationState) -> Result<RoutingDecision> {
        let request = LlmRequest {
            system_prompt: Some(SUPERVISOR_SYSTEM_PROMPT.to_string()),
            messages: vec![ChatMessage::user(Self::build_input(state))],
            temperature: Some(0.0),
            max_tokens: None,
        };

        let response = self.llm.complete(request).await?;
        let decision = parse_decision(&response.content);

        info!(next = %decision.next, reason = %decision.reason, "Supervisor decision");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_common::{Message, Origin};
    use quorum_llm::MockLlm;

    #[test]
    fn first_turn_input_has_no_scratchpad() {
        let state = ConversationState::new("What is the capital of France?");
        let input = SupervisorNode::build_input(&state);
        assert_eq!(
            input,
            "The user's question is: 'What is the capital of France?'"
        );
    }

    #[test]
    fn later_turns_include_prior_work() {
        let mut state = ConversationState::new("What is the capital of France?");
        state.push(Message::from_node(Origin::Researcher, "Paris."));

        let input = SupervisorNode::build_input(&state);
        assert!(input.contains("The user's original question is: 'What is the capital of France?'"));
        assert!(input.contains("researcher: Paris."));
        assert!(input.contains("what is the next best step?"));
    }

    #[tokio::test]
    async fn decide_parses_model_output() {
        let llm = Arc::new(MockLlm::scripted([
            r#"{"next": "researcher", "reason": "needs a factual lookup"}"#,
        ]));
        let node = SupervisorNode::new(llm.clone());

        let decision = node
            .decide(&ConversationState::new("Who won the 2022 World Cup?"))
            .await
            .unwrap();

        assert_eq!(decision.next, "researcher");

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert!(requests[0].system_prompt.as_ref().unwrap().contains("supervisor"));
    }
}
