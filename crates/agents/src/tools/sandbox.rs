use std::time::Duration;

use async_trait::async_trait;
use quorum_common::{QuorumError, Result};
use tracing::debug;

/// A single-use code execution environment. Consuming `self` means a
/// sandbox can never be reused across invocations; the coder gets a
/// fresh one from the factory each time.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    async fn execute(self: Box<Self>, code: &str) -> Result<String>;
}

/// Creates one sandbox per coder invocation.
pub trait SandboxFactory: Send + Sync {
    fn create(&self) -> Box<dyn CodeSandbox>;
}

/// Runs Python source through the local `python3` interpreter.
pub struct PythonSandbox {
    timeout: Duration,
}

impl PythonSandbox {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CodeSandbox for PythonSandbox {
    async fn execute(self: Box<Self>, code: &str) -> Result<String> {
        debug!(code_len = code.len(), "Executing Python snippet");

        let child = tokio::process::Command::new("python3")
            .arg("-c")
            .arg(code)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| QuorumError::Sandbox(format!("Failed to spawn python3: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                QuorumError::Sandbox(format!(
                    "Python execution timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| QuorumError::Sandbox(format!("Failed to run python3: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(QuorumError::Sandbox(format!(
                "Python exited with {}: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}

pub struct PythonSandboxFactory {
    timeout: Duration,
}

impl PythonSandboxFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PythonSandboxFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl SandboxFactory for PythonSandboxFactory {
    fn create(&self) -> Box<dyn CodeSandbox> {
        Box::new(PythonSandbox::new(self.timeout))
    }
}

/// Pull the contents of the first fenced code block out of model output.
/// Returns the whole trimmed text when no fence is present.
pub fn extract_code_block(text: &str) -> String {
    if let Some(open) = text.find("```") {
        let after_fence = &text[open + 3..];
        // Skip the language tag on the opening fence line.
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(close) = body.find("```") {
            return body[..close].trim().to_string();
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_python_block() {
        let text = "Here you go:\n```python\nprint(2 + 2)\n```\nThat prints 4.";
        assert_eq!(extract_code_block(text), "print(2 + 2)");
    }

    #[test]
    fn extracts_fence_without_language_tag() {
        let text = "```\nprint('hi')\n```";
        assert_eq!(extract_code_block(text), "print('hi')");
    }

    #[test]
    fn unfenced_text_is_returned_whole() {
        assert_eq!(extract_code_block("  print(1)  "), "print(1)");
    }

    #[test]
    fn unclosed_fence_falls_back_to_whole_text() {
        let text = "```python\nprint(1)";
        assert_eq!(extract_code_block(text), "```python\nprint(1)");
    }

    #[tokio::test]
    async fn python_sandbox_runs_or_reports_error() {
        // Tolerate hosts without python3: success must yield the printed
        // value, failure must surface as a Sandbox error.
        let sandbox = Box::new(PythonSandbox::new(Duration::from_secs(10)));
        match sandbox.execute("print(21 * 2)").await {
            Ok(output) => assert_eq!(output, "42"),
            Err(e) => assert!(e.to_string().contains("python3") || e.to_string().contains("Python")),
        }
    }

    #[tokio::test]
    async fn factory_creates_fresh_sandboxes() {
        let factory = PythonSandboxFactory::default();
        let a = factory.create();
        let b = factory.create();
        // Each sandbox is independently consumable.
        let _ = a.execute("print(1)").await;
        let _ = b.execute("print(2)").await;
    }
}
