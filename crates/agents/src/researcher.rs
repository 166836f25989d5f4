use std::sync::Arc;

use async_trait::async_trait;
use quorum_common::{ConversationState, Message, Result};
use quorum_llm::{ChatMessage, LlmClient, LlmRequest};
use tracing::info;

use crate::tools::SearchProvider;
use crate::traits::{Specialist, SpecialistKind};

const RESEARCHER_SYSTEM_PROMPT: &str = "\
You are a research agent. You are given a question and a set of web search \
results. Answer the question concisely using only the information in the \
results. If the results do not contain the answer, say what is missing \
instead of guessing.";

/// Specialist that searches the web and synthesizes an answer from the
/// results.
pub struct ResearcherAgent {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchProvider>,
}

impl ResearcherAgent {
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchProvider>) -> Self {
        Self { llm, search }
    }
}

#[async_trait]
impl Specialist for ResearcherAgent {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Researcher
    }

    async fn answer(&self, state: &ConversationState) -> Result<Message> {
        // Work the newest user message, not the thread's first question.
        let question = state.current_question();

        let hits = self.search.search(question).await?;
        info!(query = %question, hits = hits.len(), "Researcher search complete");

        let evidence = if hits.is_empty() {
            "No search results were returned.".to_string()
        } else {
            hits.iter()
                .enumerate()
                .map(|(i, hit)| format!("{}. {} ({})\n{}", i + 1, hit.title, hit.url, hit.snippet))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let mut prompt = format!("Question: {question}\n\n");
        if state.messages.len() > 1 {
            prompt.push_str(&format!(
                "Conversation so far:\n{}\n\n",
                state.transcript()
            ));
        }
        prompt.push_str(&format!("Search results:\n{evidence}"));

        let request = LlmRequest {
            system_prompt: Some(RESEARCHER_SYSTEM_PROMPT.to_string()),
            messages: vec![ChatMessage::user(prompt)],
            ..Default::default()
        };

        let response = self.llm.complete(request).await?;
        Ok(Message::from_node(self.kind().origin(), response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::SearchHit;
    use quorum_common::Origin;
    use quorum_llm::MockLlm;

    struct FixedSearch {
        hits: Vec<SearchHit>,
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
            Ok(self.hits.clone())
        }
    }

    #[tokio::test]
    async fn answer_includes_search_evidence_in_prompt() {
        let llm = Arc::new(MockLlm::scripted(["The capital of France is Paris."]));
        let search = Arc::new(FixedSearch {
            hits: vec![SearchHit {
                title: "Paris".to_string(),
                url: "https://en.wikipedia.org/wiki/Paris".to_string(),
                snippet: "Paris is the capital of France.".to_string(),
            }],
        });

        let agent = ResearcherAgent::new(llm.clone(), search);
        let state = ConversationState::new("What is the capital of France?");

        let message = agent.answer(&state).await.unwrap();
        assert_eq!(message.origin, Origin::Researcher);
        assert_eq!(message.content, "The capital of France is Paris.");

        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("Question: What is the capital of France?"));
        assert!(prompt.contains("1. Paris (https://en.wikipedia.org/wiki/Paris)"));
        assert!(prompt.contains("Paris is the capital of France."));
    }

    #[tokio::test]
    async fn follow_up_question_drives_the_search() {
        let llm = Arc::new(MockLlm::scripted(["About 2.1 million people."]));
        let queries = Arc::new(std::sync::Mutex::new(Vec::new()));

        struct RecordingSearch {
            queries: Arc<std::sync::Mutex<Vec<String>>>,
        }

        #[async_trait]
        impl SearchProvider for RecordingSearch {
            async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
                self.queries.lock().unwrap().push(query.to_string());
                Ok(vec![])
            }
        }

        let agent = ResearcherAgent::new(
            llm.clone(),
            Arc::new(RecordingSearch {
                queries: queries.clone(),
            }),
        );

        let mut state = ConversationState::new("What is the capital of France?");
        state.push(Message::from_node(Origin::Researcher, "Paris."));
        state.push(Message::user("And what is its population?"));

        agent.answer(&state).await.unwrap();

        assert_eq!(
            queries.lock().unwrap().as_slice(),
            ["And what is its population?"]
        );

        // Prior exchanges travel with the prompt on a resumed thread.
        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("Question: And what is its population?"));
        assert!(prompt.contains("researcher: Paris."));
    }

    #[tokio::test]
    async fn empty_results_are_stated_in_prompt() {
        let llm = Arc::new(MockLlm::scripted(["I could not find anything."]));
        let agent = ResearcherAgent::new(llm.clone(), Arc::new(FixedSearch { hits: vec![] }));

        agent
            .answer(&ConversationState::new("obscure question"))
            .await
            .unwrap();

        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("No search results were returned."));
    }
}
