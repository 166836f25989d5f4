use std::collections::HashMap;
use std::sync::Arc;

use quorum_agents::supervisor::SupervisorNode;
use quorum_agents::validator::ValidatorNode;
use quorum_agents::{Specialist, SpecialistKind};
use quorum_checkpoint::CheckpointStore;
use quorum_common::{
    ConversationState, Message, NextNode, Origin, QuorumError, Result, RoutingDecision,
};
use tracing::{info, warn};

/// Where the runner sends the conversation when the supervisor produces a
/// routing label outside the valid set.
const FALLBACK_SPECIALIST: SpecialistKind = SpecialistKind::Researcher;

/// The routing workflow: supervisor picks a specialist, the specialist
/// answers, the validator gates the answer, and the loop repeats until
/// the validator accepts or the attempt ceiling is hit.
pub struct ChatGraph {
    supervisor: SupervisorNode,
    validator: ValidatorNode,
    specialists: HashMap<SpecialistKind, Arc<dyn Specialist>>,
    store: Arc<dyn CheckpointStore>,
    max_attempts: u32,
}

impl ChatGraph {
    /// Build the graph, checking up front that every routing target has
    /// exactly one specialist behind it.
    pub fn new(
        supervisor: SupervisorNode,
        validator: ValidatorNode,
        specialists: Vec<Arc<dyn Specialist>>,
        store: Arc<dyn CheckpointStore>,
        max_attempts: u32,
    ) -> Result<Self> {
        let mut by_kind: HashMap<SpecialistKind, Arc<dyn Specialist>> = HashMap::new();
        for specialist in specialists {
            let kind = specialist.kind();
            if by_kind.insert(kind, specialist).is_some() {
                return Err(QuorumError::Config(format!(
                    "Duplicate specialist registered for '{kind}'"
                )));
            }
        }

        for kind in [SpecialistKind::Researcher, SpecialistKind::Coder] {
            if !by_kind.contains_key(&kind) {
                return Err(QuorumError::Config(format!(
                    "No specialist registered for '{kind}'"
                )));
            }
        }

        Ok(Self {
            supervisor,
            validator,
            specialists: by_kind,
            store,
            max_attempts,
        })
    }

    /// Turn a supervisor decision into the next node, overriding invalid
    /// labels instead of failing the turn.
    fn route_supervisor(&self, decision: &RoutingDecision) -> NextNode {
        if decision.next.trim().eq_ignore_ascii_case("finish") {
            return NextNode::Finish;
        }

        match SpecialistKind::from_label(&decision.next) {
            Some(kind) => kind.next_node(),
            None => {
                warn!(
                    label = %decision.next,
                    fallback = %FALLBACK_SPECIALIST,
                    "Invalid routing label from supervisor, overriding"
                );
                FALLBACK_SPECIALIST.next_node()
            }
        }
    }

    /// Run one user turn for a thread and return the resulting state.
    ///
    /// A blank message on an existing thread re-runs the workflow over the
    /// saved history without appending anything; on a new thread it is
    /// rejected.
    pub async fn invoke(&self, thread_id: &str, message: &str) -> Result<ConversationState> {
        let trimmed = message.trim();

        let mut state = match self.store.load(thread_id).await? {
            Some(mut state) => {
                if !trimmed.is_empty() {
                    state.push(Message::user(trimmed));
                }
                state
            }
            None => {
                if trimmed.is_empty() {
                    return Err(QuorumError::InvalidRequest(
                        "Message must not be empty for a new conversation".to_string(),
                    ));
                }
                ConversationState::new(trimmed)
            }
        };

        state.next = NextNode::Supervisor;
        state.attempts = 0;
        self.store.save(thread_id, &state).await?;

        info!(thread_id = %thread_id, messages = state.messages.len(), "Starting turn");

        loop {
            match state.next {
                NextNode::Supervisor => {
                    let decision = self.supervisor.decide(&state).await?;
                    // The reason goes into history so later supervisor
                    // passes see their own earlier routing rationale.
                    state.push(Message::from_node(Origin::Supervisor, decision.reason.clone()));
                    state.next = self.route_supervisor(&decision);
                }
                NextNode::Researcher => {
                    self.run_specialist(SpecialistKind::Researcher, &mut state)
                        .await?;
                }
                NextNode::Coder => {
                    self.run_specialist(SpecialistKind::Coder, &mut state).await?;
                }
                NextNode::Validator => {
                    let decision = self.validator.decide(&state).await?;
                    let note = if decision.reason.is_empty() {
                        decision.next.clone()
                    } else {
                        decision.reason.clone()
                    };
                    state.push(Message::from_node(Origin::Validator, note));

                    if ValidatorNode::accepts(&decision) {
                        state.next = NextNode::Finish;
                    } else {
                        state.attempts += 1;
                        if state.attempts >= self.max_attempts {
                            warn!(
                                thread_id = %thread_id,
                                attempts = state.attempts,
                                "Attempt ceiling reached, finishing with best effort"
                            );
                            state.next = NextNode::Finish;
                        } else {
                            state.next = NextNode::Supervisor;
                        }
                    }
                }
                NextNode::Finish => break,
            }

            self.store.save(thread_id, &state).await?;
        }

        info!(thread_id = %thread_id, messages = state.messages.len(), "Turn complete");
        Ok(state)
    }

    async fn run_specialist(
        &self,
        kind: SpecialistKind,
        state: &mut ConversationState,
    ) -> Result<()> {
        // Construction guarantees the entry exists.
        let specialist = self
            .specialists
            .get(&kind)
            .ok_or_else(|| QuorumError::Config(format!("No specialist for '{kind}'")))?;

        let answer = specialist.answer(state).await?;
        state.push(answer);
        state.next = NextNode::Validator;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quorum_checkpoint::InMemoryCheckpointStore;
    use quorum_common::NO_ANSWER_FALLBACK;
    use quorum_llm::MockLlm;

    struct FixedSpecialist {
        kind: SpecialistKind,
        content: &'static str,
    }

    #[async_trait]
    impl Specialist for FixedSpecialist {
        fn kind(&self) -> SpecialistKind {
            self.kind
        }
        async fn answer(&self, _state: &ConversationState) -> Result<Message> {
            Ok(Message::from_node(self.kind.origin(), self.content))
        }
    }

    fn specialists() -> Vec<Arc<dyn Specialist>> {
        vec![
            Arc::new(FixedSpecialist {
                kind: SpecialistKind::Researcher,
                content: "Paris is the capital of France.",
            }),
            Arc::new(FixedSpecialist {
                kind: SpecialistKind::Coder,
                content: "The result is 42.",
            }),
        ]
    }

    fn graph_with(
        supervisor_script: Vec<&str>,
        validator_script: Vec<&str>,
        max_attempts: u32,
    ) -> ChatGraph {
        ChatGraph::new(
            SupervisorNode::new(Arc::new(MockLlm::scripted(supervisor_script))),
            ValidatorNode::new(Arc::new(MockLlm::scripted(validator_script))),
            specialists(),
            Arc::new(InMemoryCheckpointStore::new()),
            max_attempts,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn happy_path_routes_through_researcher() {
        let graph = graph_with(
            vec![r#"{"next": "researcher", "reason": "factual lookup"}"#],
            vec![r#"{"next": "FINISH", "reason": "answers the question"}"#],
            3,
        );

        let state = graph
            .invoke("t1", "What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(state.final_answer(), "Paris is the capital of France.");
        assert_eq!(state.next, NextNode::Finish);
        // user question, supervisor reason, researcher answer, validator note
        assert_eq!(state.messages.len(), 4);
        assert_eq!(state.attempts, 0);
    }

    #[tokio::test]
    async fn supervisor_reason_is_recorded_in_history() {
        let graph = graph_with(
            vec![r#"{"next": "researcher", "reason": "factual lookup"}"#],
            vec![r#"{"next": "FINISH", "reason": "answers the question"}"#],
            3,
        );

        let state = graph
            .invoke("t1", "What is the capital of France?")
            .await
            .unwrap();

        let origins: Vec<Origin> = state.messages.iter().map(|m| m.origin).collect();
        assert_eq!(
            origins,
            [
                Origin::User,
                Origin::Supervisor,
                Origin::Researcher,
                Origin::Validator
            ]
        );
        assert_eq!(state.messages[1].content, "factual lookup");
        // Routing chatter never becomes the user-visible answer.
        assert_eq!(state.final_answer(), "Paris is the capital of France.");
    }

    #[tokio::test]
    async fn invalid_routing_label_falls_back_to_researcher() {
        let graph = graph_with(
            vec![r#"{"next": "banana", "reason": "confused"}"#],
            vec![r#"{"next": "FINISH", "reason": "good enough"}"#],
            3,
        );

        let state = graph.invoke("t1", "Anything?").await.unwrap();
        assert_eq!(state.final_answer(), "Paris is the capital of France.");
    }

    #[tokio::test]
    async fn immediate_finish_yields_fallback_answer() {
        let graph = graph_with(
            vec![r#"{"next": "FINISH", "reason": "nothing to do"}"#],
            vec![],
            3,
        );

        let state = graph.invoke("t1", "Hello").await.unwrap();
        assert_eq!(state.final_answer(), NO_ANSWER_FALLBACK);
        assert_eq!(state.next, NextNode::Finish);
    }

    #[tokio::test]
    async fn rejected_answer_loops_back_through_supervisor() {
        let graph = graph_with(
            vec![
                r#"{"next": "researcher", "reason": "lookup"}"#,
                r#"{"next": "coder", "reason": "try computing instead"}"#,
            ],
            vec![
                r#"{"next": "supervisor", "reason": "answer is off topic"}"#,
                r#"{"next": "FINISH", "reason": "answers the question"}"#,
            ],
            3,
        );

        let state = graph.invoke("t1", "What is 21 * 2?").await.unwrap();

        // Between supervisor passes the history grows by exactly two
        // messages: the specialist answer and the validator note.
        let origins: Vec<Origin> = state.messages.iter().map(|m| m.origin).collect();
        assert_eq!(
            origins,
            [
                Origin::User,
                Origin::Supervisor,
                Origin::Researcher,
                Origin::Validator,
                Origin::Supervisor,
                Origin::Coder,
                Origin::Validator
            ]
        );
        assert_eq!(state.final_answer(), "The result is 42.");
        assert_eq!(state.attempts, 1);
    }

    #[tokio::test]
    async fn attempt_ceiling_terminates_with_best_effort() {
        let graph = graph_with(
            vec![
                r#"{"next": "researcher", "reason": "lookup"}"#,
                r#"{"next": "researcher", "reason": "try again"}"#,
            ],
            vec![
                r#"{"next": "supervisor", "reason": "not good enough"}"#,
                r#"{"next": "supervisor", "reason": "still not good enough"}"#,
            ],
            2,
        );

        let state = graph.invoke("t1", "Impossible question").await.unwrap();

        assert_eq!(state.next, NextNode::Finish);
        assert_eq!(state.attempts, 2);
        // Best effort: the last specialist answer is still surfaced.
        assert_eq!(state.final_answer(), "Paris is the capital of France.");
    }

    #[tokio::test]
    async fn resuming_thread_appends_new_message() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let graph = ChatGraph::new(
            SupervisorNode::new(Arc::new(MockLlm::scripted([
                r#"{"next": "researcher", "reason": "lookup"}"#,
                r#"{"next": "researcher", "reason": "follow up"}"#,
            ]))),
            ValidatorNode::new(Arc::new(MockLlm::scripted([
                r#"{"next": "FINISH", "reason": "ok"}"#,
                r#"{"next": "FINISH", "reason": "ok"}"#,
            ]))),
            specialists(),
            store.clone(),
            3,
        )
        .unwrap();

        graph
            .invoke("t1", "What is the capital of France?")
            .await
            .unwrap();
        let state = graph.invoke("t1", "And its population?").await.unwrap();

        // Both user messages survive in order.
        assert_eq!(state.messages[0].content, "What is the capital of France?");
        assert!(state
            .messages
            .iter()
            .any(|m| m.origin == Origin::User && m.content == "And its population?"));

        let saved = store.load("t1").await.unwrap().unwrap();
        assert_eq!(saved.messages.len(), state.messages.len());
    }

    #[tokio::test]
    async fn blank_message_on_existing_thread_appends_nothing() {
        let graph = graph_with(
            vec![
                r#"{"next": "researcher", "reason": "lookup"}"#,
                r#"{"next": "FINISH", "reason": "already answered"}"#,
            ],
            vec![r#"{"next": "FINISH", "reason": "ok"}"#],
            3,
        );

        let first = graph
            .invoke("t1", "What is the capital of France?")
            .await
            .unwrap();
        let second = graph.invoke("t1", "   ").await.unwrap();

        let user_messages = second
            .messages
            .iter()
            .filter(|m| m.origin == Origin::User)
            .count();
        assert_eq!(user_messages, 1);
        assert_eq!(second.final_answer(), first.final_answer());
    }

    #[tokio::test]
    async fn blank_message_on_new_thread_is_rejected() {
        let graph = graph_with(vec![], vec![], 3);
        let err = graph.invoke("fresh", "   ").await.unwrap_err();
        assert!(matches!(err, QuorumError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn construction_requires_every_specialist() {
        let result = ChatGraph::new(
            SupervisorNode::new(Arc::new(MockLlm::scripted(Vec::<String>::new()))),
            ValidatorNode::new(Arc::new(MockLlm::scripted(Vec::<String>::new()))),
            vec![Arc::new(FixedSpecialist {
                kind: SpecialistKind::Researcher,
                content: "only one",
            })],
            Arc::new(InMemoryCheckpointStore::new()),
            3,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn construction_rejects_duplicate_specialists() {
        let mut registered = specialists();
        registered.push(Arc::new(FixedSpecialist {
            kind: SpecialistKind::Coder,
            content: "duplicate",
        }));

        let result = ChatGraph::new(
            SupervisorNode::new(Arc::new(MockLlm::scripted(Vec::<String>::new()))),
            ValidatorNode::new(Arc::new(MockLlm::scripted(Vec::<String>::new()))),
            registered,
            Arc::new(InMemoryCheckpointStore::new()),
            3,
        );
        assert!(result.is_err());
    }
}
