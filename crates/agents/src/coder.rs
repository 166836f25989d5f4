use std::sync::Arc;

use async_trait::async_trait;
use quorum_common::{ConversationState, Message, Result};
use quorum_llm::{ChatMessage, LlmClient, LlmRequest};
use tracing::{info, warn};

use crate::tools::{extract_code_block, SandboxFactory};
use crate::traits::{Specialist, SpecialistKind};

const CODER_SYSTEM_PROMPT: &str = "\
You are a coding agent. Solve the user's problem by writing a short Python \
script that prints the result. Reply with a single fenced code block:

```python
<your code>
```

Do not explain the code outside the block.";

const FINALIZE_SYSTEM_PROMPT: &str = "\
You are a coding agent. You wrote a Python script to answer the user's \
question and it has been executed. State the final answer to the question \
in one or two sentences, based on the execution output.";

/// Specialist that drafts Python, executes it in a fresh sandbox, and
/// phrases a final answer from the output.
pub struct CoderAgent {
    llm: Arc<dyn LlmClient>,
    sandboxes: Arc<dyn SandboxFactory>,
}

impl CoderAgent {
    pub fn new(llm: Arc<dyn LlmClient>, sandboxes: Arc<dyn SandboxFactory>) -> Self {
        Self { llm, sandboxes }
    }
}

#[async_trait]
impl Specialist for CoderAgent {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Coder
    }

    async fn answer(&self, state: &ConversationState) -> Result<Message> {
        // Work the newest user message, not the thread's first question.
        let question = state.current_question();

        let task = if state.messages.len() > 1 {
            format!(
                "Conversation so far:\n{}\n\nWrite code to answer: {question}",
                state.transcript()
            )
        } else {
            question.to_string()
        };

        let draft_request = LlmRequest {
            system_prompt: Some(CODER_SYSTEM_PROMPT.to_string()),
            messages: vec![ChatMessage::user(task)],
            ..Default::default()
        };
        let draft = self.llm.complete(draft_request).await?;
        let code = extract_code_block(&draft.content);

        // The sandbox is single-use; a failed run becomes an observation
        // for the model rather than a failed turn.
        let observation = match self.sandboxes.create().execute(&code).await {
            Ok(output) if output.is_empty() => "(no output)".to_string(),
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Code execution failed");
                format!("Execution failed: {e}")
            }
        };
        info!(code_len = code.len(), "Coder executed snippet");

        let finalize_request = LlmRequest {
            system_prompt: Some(FINALIZE_SYSTEM_PROMPT.to_string()),
            messages: vec![ChatMessage::user(format!(
                "Question: {question}\n\nCode:\n{code}\n\nExecution output:\n{observation}"
            ))],
            ..Default::default()
        };
        let response = self.llm.complete(finalize_request).await?;

        Ok(Message::from_node(self.kind().origin(), response.content))
    }
}
