use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use quorum_common::{QuorumError, Result};

use crate::client::{LlmClient, LlmRequest, LlmResponse};

/// Scripted client for tests. Pops one canned response per call and
/// records every request it receives.
pub struct MockLlm {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request);

        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| QuorumError::Llm("Mock script exhausted".to_string()))?;

        Ok(LlmResponse {
            content,
            model: "mock".to_string(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
